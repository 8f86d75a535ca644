use crate::interface::{Artifact, ResultRecord};
use crate::prelude::{PipelineResult, ProcessingStage};

/// Packages named artifacts into a [`ResultRecord`].
///
/// Pure packaging: a repeated name overwrites the earlier artifact while
/// keeping its original position.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputAssembler;

impl OutputAssembler {
    pub fn assemble<I, K>(artifacts: I) -> ResultRecord
    where
        I: IntoIterator<Item = (K, Artifact)>,
        K: Into<String>,
    {
        let mut record = ResultRecord::default();
        for (name, artifact) in artifacts {
            record.insert(name.into(), artifact);
        }
        record
    }
}

impl ProcessingStage<Vec<(String, Artifact)>> for OutputAssembler {
    type Output = ResultRecord;

    fn name(&self) -> &'static str {
        "output-assembler"
    }

    fn execute(&self, artifacts: Vec<(String, Artifact)>) -> PipelineResult<ResultRecord> {
        Ok(Self::assemble(artifacts))
    }
}
