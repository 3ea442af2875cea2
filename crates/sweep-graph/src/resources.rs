use serde::{Deserialize, Serialize};
use sweep_core::{Parameters, SweepError};

/// Wall-clock limit applied to slicing, comparison and summary jobs.
pub const DEFAULT_JOB_MINUTES: u64 = 120;

/// Scheduler resources attached to a job.
///
/// Unset fields fall back to the execution engine's defaults. The partition
/// doubles as the job's concurrency category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_time_in_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_gpus: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ResourceRequest {
    /// Request carrying only a wall-clock limit.
    pub fn minutes(job_time_in_minutes: u64) -> Self {
        Self {
            job_time_in_minutes: Some(job_time_in_minutes),
            ..Self::default()
        }
    }

    /// Reads the resource keys present in `params`; other keys are ignored.
    pub fn from_parameters(params: &Parameters) -> Result<Self, SweepError> {
        Ok(Self {
            partition: params.optional_string("partition")?,
            job_time_in_minutes: params.optional_positive_integer("job_time_in_minutes")?,
            num_cpus: params.optional_positive_integer("num_cpus")?,
            num_gpus: params.optional_count("num_gpus")?,
            memory: params.optional_string("memory")?,
        })
    }

    /// Field-wise merge where values set on `other` win.
    pub fn unify(&self, other: &ResourceRequest) -> ResourceRequest {
        ResourceRequest {
            partition: other.partition.clone().or_else(|| self.partition.clone()),
            job_time_in_minutes: other.job_time_in_minutes.or(self.job_time_in_minutes),
            num_cpus: other.num_cpus.or(self.num_cpus),
            num_gpus: other.num_gpus.or(self.num_gpus),
            memory: other.memory.clone().or_else(|| self.memory.clone()),
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Concurrency category the job is counted against.
    pub fn category(&self) -> Option<&str> {
        self.partition.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn right_operand_wins_field_by_field() {
        let base = ResourceRequest::minutes(720).with_partition("gaia");
        let merged = base.unify(&ResourceRequest {
            num_gpus: Some(0),
            ..ResourceRequest::default().with_partition("mics")
        });
        assert_eq!(merged.partition.as_deref(), Some("mics"));
        assert_eq!(merged.job_time_in_minutes, Some(720));
        assert_eq!(merged.num_gpus, Some(0));
    }

    #[test]
    fn reads_known_keys_only() {
        let params = Parameters::from_pairs([
            ("partition", json!("gaia")),
            ("num_gpus", json!(2)),
            ("lr", json!(0.1)),
        ]);
        let request = ResourceRequest::from_parameters(&params).expect("request");
        assert_eq!(request.category(), Some("gaia"));
        assert_eq!(request.num_gpus, Some(2));
        assert_eq!(request.job_time_in_minutes, None);

        let bad = Parameters::from_pairs([("job_time_in_minutes", json!("soon"))]);
        assert!(ResourceRequest::from_parameters(&bad).unwrap_err().is_config());
    }
}
