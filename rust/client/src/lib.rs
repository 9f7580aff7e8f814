extern crate reqwest;
extern crate serde;
extern crate serde_json;

pub mod common;
pub mod error;
pub mod mdps;

pub use common::defs::*;
pub use error::*;
pub use mdps::*;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::ser::Serialize;
use serde_json::{to_value, Map, Value};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;
use value_extensions::*;

#[derive(Debug, Clone, PartialEq)]
pub enum ObsActSpace {
    /// Refer: https://www.gymlibrary.dev/api/spaces/#discrete
    Discrete { n: Discrete },

    /// Refer: https://www.gymlibrary.dev/api/spaces/#box
    Box {
        shape: Vec<Discrete>,
        high: Vec<Continous>,
        low: Vec<Continous>,
    },
}

impl ObsActSpace {
    pub fn from_json(info: &Map<String, Value>) -> GymResult<Self> {
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GymError::MissingField("name".to_string()))?;

        match name {
            "Discrete" => Ok(ObsActSpace::Discrete {
                n: as_discrete(field(info, "n")?)?,
            }),
            "Box" => Ok(ObsActSpace::Box {
                shape: as_discrete_item_vec(field(info, "shape")?)?,
                high: as_continous_item_vec(field(info, "high")?)?,
                low: as_continous_item_vec(field(info, "low")?)?,
            }),
            e => Err(GymError::UnsupportedSpace(e.to_string())),
        }
    }

    /// Number of elements of a `Discrete` space.
    pub fn discrete_n(&self) -> GymResult<Discrete> {
        match self {
            ObsActSpace::Discrete { n } => Ok(*n),
            s => Err(GymError::UnsupportedSpace(format!("{s:?}"))),
        }
    }
}

/// Create a gymnasium environment or get reference to an existing one.
/// NOTE: All APIs are sync as the server is expected to be local.
#[derive(Debug)]
pub struct Environment {
    client: Client,
    api_url: String,
    instance_id: String,
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
}

impl Environment {
    pub fn envs(api_url: &str) -> GymResult<HashMap<String, String>> {
        let client = Client::new(api_url)?;

        let url = client.make_api_url("");
        let val = client.http_get(&url)?;

        let obj = val
            .get("all_envs")
            .and_then(Value::as_object)
            .ok_or_else(|| GymError::MissingField("all_envs".to_string()))?;

        Ok(obj
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
            .collect())
    }

    pub fn new(
        api_url: &str,
        env_name: &str,
        max_episode_steps: Option<Discrete>,
        auto_reset: Option<bool>,
        disable_env_checker: Option<bool>,
        kwargs: &[(&str, Value)],
    ) -> GymResult<Self> {
        let mut body = HashMap::from([("env_id", to_value(env_name)?)]);

        if let Some(max_episode_steps) = max_episode_steps {
            body.insert("max_episode_steps", to_value(max_episode_steps)?);
        }

        if let Some(auto_reset) = auto_reset {
            body.insert("auto_reset", to_value(auto_reset)?);
        }

        if let Some(disable_env_checker) = disable_env_checker {
            body.insert("disable_env_checker", to_value(disable_env_checker)?);
        }

        let kwargs = kwargs.iter().cloned().collect::<HashMap<&str, Value>>();
        body.insert("kwargs", to_value(kwargs)?);

        let c = Client::new(api_url)?;
        let base_url = c.make_api_url("");
        let obj = c.http_post(&base_url, &body)?;
        let inst_id = obj
            .get("instance_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GymError::MissingField("instance_id".to_string()))?;
        debug!(env_name, instance_id = inst_id, "created remote environment");

        Self::reference(api_url, inst_id)
    }

    pub fn reference(api_url: &str, instance_id: &str) -> GymResult<Self> {
        let client = Client::new(api_url)?;

        let url = client.make_api_url(&format!("{instance_id}/observation_space/"));
        let obs_space = ObsActSpace::from_json(space_info(&client.http_get(&url)?)?)?;

        let url = client.make_api_url(&format!("{instance_id}/action_space/"));
        let act_space = ObsActSpace::from_json(space_info(&client.http_get(&url)?)?)?;

        let env_api_url = client.make_api_url(&format!("{instance_id}/"));
        Ok(Self {
            client,
            api_url: env_api_url,
            instance_id: instance_id.to_string(),
            obs_space,
            act_space,
        })
    }

    pub fn client_base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn name(&self) -> GymResult<String> {
        let obj = self.client.http_get(&self.api_url)?;

        obj.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GymError::MissingField("id".to_string()))
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The Space object corresponding to valid actions. For a `Discrete(2)` action space
    /// there are two valid actions: 0 & 1.
    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.action_space
    pub fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.observation_space
    pub fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    pub fn action_space_sample(&self) -> GymResult<Discrete> {
        let url = self.make_api_url("action_space/sample/");
        let obj = self.client.http_get(&url)?;
        as_discrete(field_of(&obj, "action")?)
    }

    /// The full dynamics `P[s][a]` of the environment.
    pub fn transitions(&self) -> GymResult<Rc<Transitions>> {
        let n_s = self.observation_space().discrete_n()?;
        let n_a = self.action_space().discrete_n()?;

        let url = self.make_api_url("transitions/");
        let obj = self.client.http_get(&url)?;

        Ok(Rc::new(parse_transitions(field_of(&obj, "transitions")?, n_s, n_a)?))
    }

    fn make_api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

impl Env for Environment {
    fn reset(&mut self, seed: Option<u64>) -> GymResult<Discrete> {
        let mut body = HashMap::new();
        if let Some(seed) = seed {
            body.insert("seed", seed.to_string());
        }

        let url = self.make_api_url("reset/");
        let obj = self.client.http_post(&url, &body)?;
        as_observation(field_of(&obj, "observation")?)
    }

    fn step(&mut self, action: Discrete) -> GymResult<StepInfo> {
        let n = self.act_space.discrete_n()?;
        if action >= n {
            return Err(GymError::InvalidAction { action, n });
        }

        let req = HashMap::from([("action", to_value(action)?)]);
        let url = self.make_api_url("step/");
        let obj = self.client.http_post(&url, &req)?;

        Ok(StepInfo {
            observation: as_observation(field_of(&obj, "observation")?)?,
            reward: as_continous(field_of(&obj, "reward")?)?,
            truncated: as_bool(field_of(&obj, "truncated")?)?,
            terminated: as_bool(field_of(&obj, "terminated")?)?,
            info: obj.get("info").cloned().unwrap_or(Value::Null),
        })
    }

    fn render(&self) -> GymResult<RenderFrame> {
        let url = self.make_api_url("render/");
        let obj = self.client.http_get(&url)?;

        let rf = field_of(&obj, "render_frame")?;
        if let Some(s) = rf.as_str() {
            return Ok(RenderFrame::Ansi(s.to_string()));
        }

        let rows = as_discrete(field_of(rf, "rows")?)?;
        let cols = as_discrete(field_of(rf, "cols")?)?;
        let data = field_of(rf, "data")?
            .as_str()
            .ok_or_else(|| GymError::MissingField("data".to_string()))?;

        Ok(RenderFrame::Rgb(rows, cols, data.to_string()))
    }
}

/// Parses the server's `{ "s": { "a": [[p, s', r, done], ...] } }` dynamics payload.
pub fn parse_transitions(obj: &Value, n_s: usize, n_a: usize) -> GymResult<Transitions> {
    let mut transitions = Transitions::new(n_s, n_a);
    for s in 0..n_s {
        let s_trans = field_of(obj, &s.to_string())?;
        for a in 0..n_a {
            let a_trans = field_of(s_trans, &a.to_string())?;
            let ts = serde_json::from_value::<Vec<(Continous, Discrete, Continous, bool)>>(
                a_trans.clone(),
            )?
            .into_iter()
            .map(|(p, next, r, done)| Transition::new(p, next, r, done))
            .collect();

            transitions.insert(s, a, ts);
        }
    }

    Ok(transitions)
}

#[derive(Debug)]
pub struct Client {
    base_url: String,
    api_url: String,
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base_url: &str) -> GymResult<Self> {
        let mut base_url = base_url.replace("//localhost:", "//127.0.0.1:");
        if base_url.ends_with('/') {
            _ = base_url.remove(base_url.len() - 1);
        }

        let api_url = format!("{base_url}/v1/envs/");

        Ok(Self {
            base_url,
            api_url,
            client: reqwest::blocking::Client::builder().build()?,
        })
    }

    pub fn make_api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_get(&self, url: &str) -> GymResult<Value> {
        let res = self
            .client
            .get(url)
            .headers(Self::construct_common_headers())
            .send()?
            .error_for_status()?;
        Ok(res.json::<Value>()?)
    }

    fn http_post<T: Serialize>(&self, url: &str, body: &HashMap<&str, T>) -> GymResult<Value> {
        let res = self
            .client
            .post(url)
            .headers(Self::construct_common_headers())
            .json(body)
            .send()?
            .error_for_status()?;
        Ok(res.json::<Value>()?)
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

mod value_extensions {
    use super::*;

    pub fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> GymResult<&'a Value> {
        obj.get(key)
            .ok_or_else(|| GymError::MissingField(key.to_string()))
    }

    pub fn field_of<'a>(val: &'a Value, key: &str) -> GymResult<&'a Value> {
        val.get(key)
            .ok_or_else(|| GymError::MissingField(key.to_string()))
    }

    pub fn space_info(val: &Value) -> GymResult<&Map<String, Value>> {
        field_of(val, "info")?
            .as_object()
            .ok_or_else(|| GymError::MissingField("info".to_string()))
    }

    pub fn as_discrete(val: &Value) -> GymResult<Discrete> {
        Ok(serde_json::from_value::<Discrete>(val.clone())?)
    }

    pub fn as_continous(val: &Value) -> GymResult<Continous> {
        Ok(serde_json::from_value::<Continous>(val.clone())?)
    }

    pub fn as_bool(val: &Value) -> GymResult<bool> {
        Ok(serde_json::from_value::<bool>(val.clone())?)
    }

    /// Discrete observations arrive either bare or as a singleton array.
    pub fn as_observation(val: &Value) -> GymResult<Discrete> {
        match val.as_array() {
            Some(items) => match items.as_slice() {
                [item] => as_discrete(item),
                _ => Err(GymError::UnsupportedSpace(format!(
                    "observation {val} is not a single discrete value"
                ))),
            },
            None => as_discrete(val),
        }
    }

    pub fn as_discrete_item_vec(val: &Value) -> GymResult<Vec<Discrete>> {
        Ok(serde_json::from_value::<Vec<Discrete>>(val.clone())?)
    }

    pub fn as_continous_item_vec(val: &Value) -> GymResult<Vec<Continous>> {
        Ok(serde_json::from_value::<Vec<Continous>>(val.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertor::*;
    use float_eq::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn parse_transitions_builds_dense_table() {
        let payload = json!({
            "0": {
                "0": [[1.0, 0, 0.0, false]],
                "1": [[0.5, 1, 1.0, true], [0.5, 0, 0.0, false]],
            },
            "1": {
                "0": [[1.0, 1, 0.0, true]],
                "1": [],
            },
        });

        let ts = parse_transitions(&payload, 2, 2).unwrap();

        assert_eq!(ts.len(), 4);
        assert_eq!(ts[(0, 1)].len(), 2);
        assert_eq!(ts[(0, 1)][0], Transition::new(0.5, 1, 1.0, true));
        assert_float_eq!(ts[(0, 1)][1].probability, 0.5, abs <= 1e-12);
        assert!(ts[(1, 1)].is_empty());
    }

    #[test]
    fn parse_transitions_reports_missing_action() {
        let payload = json!({ "0": { "0": [[1.0, 0, 0.0, false]] } });

        let err = parse_transitions(&payload, 1, 2).unwrap_err();

        assert!(matches!(err, GymError::MissingField(ref k) if k == "1"));
        insta::assert_snapshot!(err.to_string(), @"response has no '1' field");
    }

    #[rstest]
    #[case(json!({"name": "Discrete", "n": 16}), ObsActSpace::Discrete { n: 16 })]
    #[case(
        json!({"name": "Box", "shape": [2], "high": [0.6, 0.07], "low": [-1.2, -0.07]}),
        ObsActSpace::Box { shape: vec![2], high: vec![0.6, 0.07], low: vec![-1.2, -0.07] }
    )]
    fn parse_spaces(#[case] info: Value, #[case] expected: ObsActSpace) {
        let space = ObsActSpace::from_json(info.as_object().unwrap()).unwrap();

        assert_eq!(space, expected);
    }

    #[test]
    fn box_space_is_not_discrete() {
        let space = ObsActSpace::Box {
            shape: vec![1],
            high: vec![1.],
            low: vec![0.],
        };

        assert!(matches!(
            space.discrete_n(),
            Err(GymError::UnsupportedSpace(_))
        ));
    }

    #[rstest]
    #[case(json!(5), 5)]
    #[case(json!([9]), 9)]
    fn observations_bare_or_singleton(#[case] val: Value, #[case] expected: Discrete) {
        assert_eq!(as_observation(&val).unwrap(), expected);
    }

    #[test]
    fn client_normalizes_base_url() {
        let c = Client::new("http://localhost:40004/").unwrap();

        assert_eq!(c.base_url(), "http://127.0.0.1:40004");
        assert_eq!(c.make_api_url("abc/"), "http://127.0.0.1:40004/v1/envs/abc/");
    }

    #[test]
    fn transitions_iterate_row_major() {
        let ts = Transitions::from_fn(2, 3, |s, a| vec![Transition::new(1., s, a as f64, false)]);

        let keys = ts.iter().map(|(k, _)| k).collect::<Vec<_>>();

        assert_eq!(keys, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(ts.get(1, 2).unwrap()[0].reward, 2.);
        assert!(ts.get(2, 0).is_none());
    }

    #[test]
    fn render_frames_expose_their_payload() {
        let ansi = RenderFrame::Ansi("\nSF\nHG\n".to_string());
        let rgb = RenderFrame::Rgb(2, 3, "AAEC".to_string());

        assert_that!(ansi.as_str()).is_equal_to(Some("\nSF\nHG\n"));
        assert_that!(ansi.as_rgb()).is_none();
        assert_that!(rgb.as_str()).is_none();

        let (rows, cols, data) = rgb.as_rgb().unwrap();
        assert_that!(*rows).is_equal_to(2usize);
        assert_that!(*cols).is_equal_to(3usize);
        assert_that!(data.as_str()).is_equal_to("AAEC");
    }

    #[test]
    fn tabular_policy_indexes_by_state() {
        let pi: Vec<Discrete> = vec![3, 1, 2];

        assert_eq!(pi.policy(0), 3);
        assert_eq!(pi.as_slice().policy(2), 2);
    }
}
