use anyhow::{bail, Context};
use fieldcore::interface::{FrameSeries, NamedInput, RawSignal};
use fieldcore::prelude::PRIMARY_INPUT;
use fieldcore::processing::InputAdapter;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// What a driver invocation feeds into the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    Single(Vec<NamedInput>),
    Frames(FrameSeries),
}

/// Reads a workload from a JSON file.
///
/// An object maps input names to arrays unless it holds a `frames` key, in
/// which case that key is a two-dimensional frame series. A bare array is
/// bound to the primary input.
pub fn load_workload<P: AsRef<Path>>(path: P) -> anyhow::Result<Workload> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading input file {}", path_ref.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing input file {}", path_ref.display()))?;
    parse_workload(&value).with_context(|| format!("loading inputs from {}", path_ref.display()))
}

pub fn parse_workload(value: &Value) -> anyhow::Result<Workload> {
    match value {
        Value::Object(map) => {
            if let Some(frames) = map.get("frames") {
                let series = InputAdapter::adapt_frames(frames).context("adapting frame series")?;
                return Ok(Workload::Frames(series));
            }
            if map.is_empty() {
                bail!("input object names no arrays");
            }
            Ok(Workload::Single(
                map.iter()
                    .map(|(name, data)| NamedInput::new(name.clone(), RawSignal::Json(data.clone())))
                    .collect(),
            ))
        }
        Value::Array(_) => Ok(Workload::Single(vec![NamedInput::new(
            PRIMARY_INPUT,
            RawSignal::Json(value.clone()),
        )])),
        _ => bail!("input must be a JSON object or array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn bare_array_binds_primary_input() {
        match parse_workload(&json!([1.0, 2.0])).unwrap() {
            Workload::Single(inputs) => {
                assert_eq!(inputs.len(), 1);
                assert_eq!(inputs[0].name, PRIMARY_INPUT);
            }
            other => panic!("unexpected workload {other:?}"),
        }
    }

    #[test]
    fn object_names_inputs() {
        let workload = parse_workload(&json!({"input": [1, 2], "taps": [0.5]})).unwrap();
        let Workload::Single(inputs) = workload else {
            panic!("expected named inputs");
        };
        let mut names: Vec<&str> = inputs.iter().map(|input| input.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["input", "taps"]);
    }

    #[test]
    fn frames_key_selects_series() {
        let workload = parse_workload(&json!({"frames": [[1, 2, 3], [4, 5, 6]]})).unwrap();
        let Workload::Frames(frames) = workload else {
            panic!("expected frames");
        };
        assert_eq!(frames.frame_count(), 2);
        assert_eq!(frames.frame_len(), 3);
    }

    #[test]
    fn scalars_and_ragged_frames_are_rejected() {
        assert!(parse_workload(&json!(3.5)).is_err());
        assert!(parse_workload(&json!({})).is_err());
        assert!(parse_workload(&json!({"frames": [[1, 2], [3]]})).is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{"input": [[1, 0], [0, 1]]}"#).unwrap();
        let path = temp.into_temp_path();
        assert!(matches!(load_workload(&path).unwrap(), Workload::Single(_)));
    }
}
