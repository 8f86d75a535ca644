use crate::interface::{StepSpec, TransformSpec};
use crate::prelude::{PipelineError, PipelineResult};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Steps of a spec ordered so that each one follows everything it reads.
#[derive(Debug, Clone)]
pub struct ExecutionPlan<'s> {
    steps: Vec<&'s StepSpec>,
}

impl<'s> ExecutionPlan<'s> {
    pub fn steps(&self) -> &[&'s StepSpec] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name.as_str())
    }
}

/// Orders a [`TransformSpec`] into an [`ExecutionPlan`].
///
/// Validation happens entirely up front: malformed steps, duplicate names,
/// dangling references and cycles are reported before any signal is touched.
/// Among steps whose inputs are ready, the one listed first in the spec runs
/// first, so a spec already in dependency order executes as written.
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn resolve<'s>(
        spec: &'s TransformSpec,
        inputs: &[&str],
    ) -> PipelineResult<ExecutionPlan<'s>> {
        let input_names: HashSet<&str> = inputs.iter().copied().collect();
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(spec.len());

        for (position, step) in spec.steps.iter().enumerate() {
            step.validate()?;
            if input_names.contains(step.name.as_str()) {
                return Err(PipelineError::InvalidSpec(format!(
                    "step `{}` shadows an input of the same name",
                    step.name
                )));
            }
            if index.insert(step.name.as_str(), position).is_some() {
                return Err(PipelineError::InvalidSpec(format!(
                    "step name `{}` is used more than once",
                    step.name
                )));
            }
        }

        let count = spec.len();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut pending = vec![0usize; count];
        for (position, step) in spec.steps.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in step.dependencies() {
                if !seen.insert(dep) {
                    continue;
                }
                match index.get(dep) {
                    Some(&source) => {
                        dependents[source].push(position);
                        pending[position] += 1;
                    }
                    None if input_names.contains(dep) => {}
                    None => return Err(PipelineError::UnknownReference(dep.to_string())),
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| pending[i] == 0).collect();
        let mut steps = Vec::with_capacity(count);
        while let Some(position) = ready.pop_first() {
            steps.push(&spec.steps[position]);
            for &next in &dependents[position] {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if steps.len() < count {
            return Err(PipelineError::CyclicSpec(describe_cycle(
                spec, &index, &pending,
            )));
        }
        Ok(ExecutionPlan { steps })
    }
}

/// Walks unresolved dependencies until a step repeats and renders that loop.
fn describe_cycle(spec: &TransformSpec, index: &HashMap<&str, usize>, pending: &[usize]) -> String {
    let unresolved = |name: &str| index.get(name).filter(|&&i| pending[i] > 0).copied();
    let Some(start) = pending.iter().position(|&p| p > 0) else {
        return "unresolvable steps".to_string();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(at) = path.iter().position(|&p| p == current) {
            let mut names: Vec<&str> = path[at..]
                .iter()
                .map(|&i| spec.steps[i].name.as_str())
                .collect();
            names.push(spec.steps[current].name.as_str());
            return names.join(" -> ");
        }
        path.push(current);
        match spec.steps[current]
            .dependencies()
            .into_iter()
            .find_map(|dep| unresolved(dep))
        {
            Some(next) => current = next,
            None => {
                let names: Vec<&str> = path.iter().map(|&i| spec.steps[i].name.as_str()).collect();
                return names.join(" -> ");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Operation;
    use crate::prelude::PRIMARY_INPUT;

    fn step(name: &str, inputs: &[&str]) -> StepSpec {
        StepSpec::new(name, Operation::Magnitude).with_inputs(inputs.iter().copied())
    }

    #[test]
    fn ordered_spec_runs_as_written() {
        let spec = TransformSpec::new()
            .step(step("a", &[PRIMARY_INPUT]))
            .step(step("b", &["a"]))
            .step(step("c", &["b"]));
        let plan = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap();
        assert_eq!(plan.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn forward_references_are_reordered() {
        let spec = TransformSpec::new()
            .step(step("late", &["early"]))
            .step(step("early", &[PRIMARY_INPUT]))
            .step(step("other", &[PRIMARY_INPUT]));
        let plan = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap();
        assert_eq!(plan.names().collect::<Vec<_>>(), vec!["early", "late", "other"]);
    }

    #[test]
    fn mutual_reference_is_a_cycle() {
        let spec = TransformSpec::new()
            .step(step("a", &["b"]))
            .step(step("b", &["a"]));
        let err = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap_err();
        assert_eq!(err, PipelineError::CyclicSpec("a -> b -> a".into()));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let spec = TransformSpec::new().step(step("loop", &["loop"]));
        let err = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap_err();
        assert_eq!(err, PipelineError::CyclicSpec("loop -> loop".into()));
    }

    #[test]
    fn cycle_through_kernel_reference_is_detected() {
        let spec = TransformSpec::new()
            .step(StepSpec::new(
                "smooth",
                Operation::Convolve {
                    kernel: crate::interface::KernelSource::Signal("mag".into()),
                    mode: Default::default(),
                },
            ))
            .step(step("mag", &["smooth"]));
        let err = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap_err();
        assert!(matches!(err, PipelineError::CyclicSpec(_)));
    }

    #[test]
    fn unknown_reference_is_reported() {
        let spec = TransformSpec::new().step(step("a", &["missing"]));
        let err = DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]).unwrap_err();
        assert_eq!(err, PipelineError::UnknownReference("missing".into()));
    }

    #[test]
    fn duplicate_and_shadowing_names_are_rejected() {
        let spec = TransformSpec::new()
            .step(step("a", &[PRIMARY_INPUT]))
            .step(step("a", &[PRIMARY_INPUT]));
        assert!(matches!(
            DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]),
            Err(PipelineError::InvalidSpec(_))
        ));

        let spec = TransformSpec::new().step(step(PRIMARY_INPUT, &[PRIMARY_INPUT]));
        assert!(matches!(
            DependencyResolver::resolve(&spec, &[PRIMARY_INPUT]),
            Err(PipelineError::InvalidSpec(_))
        ));
    }
}
