use ledgerprep_core::{ArtifactRef, DataRef, Error, Result, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which half of the task lifecycle a sweep handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// `todo` tasks, staged with their start model and train data
    Training,
    /// `trained` tasks, staged with their end model and test data
    Testing,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Training, Phase::Testing];

    /// Status of the tasks this phase picks up
    pub fn status_filter(self) -> TaskStatus {
        match self {
            Phase::Training => TaskStatus::Todo,
            Phase::Testing => TaskStatus::Trained,
        }
    }

    /// Status reported once a task is staged
    pub fn next_status(self) -> TaskStatus {
        match self {
            Phase::Training => TaskStatus::Training,
            Phase::Testing => TaskStatus::Testing,
        }
    }

    pub fn data_field(self) -> &'static str {
        match self {
            Phase::Training => "trainData",
            Phase::Testing => "testData",
        }
    }

    pub fn model_field(self) -> &'static str {
        match self {
            Phase::Training => "startModel",
            Phase::Testing => "endModel",
        }
    }

    pub fn data_ref(self, task: &Task) -> Result<&DataRef> {
        let data = match self {
            Phase::Training => task.train_data.as_ref(),
            Phase::Testing => task.test_data.as_ref(),
        };
        data.ok_or_else(|| Error::not_found(self.data_field(), &task.key))
    }

    pub fn model_ref(self, task: &Task) -> Result<&ArtifactRef> {
        let model = match self {
            Phase::Training => task.start_model.as_ref(),
            Phase::Testing => task.end_model.as_ref(),
        };
        model.ok_or_else(|| Error::not_found(self.model_field(), &task.key))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Training => "train",
            Phase::Testing => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "train" | "training" => Ok(Phase::Training),
            "test" | "testing" => Ok(Phase::Testing),
            other => Err(Error::invalid_input(
                "phase",
                format!("'{other}' is not one of train, test"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerprep_core::ChallengeRef;

    fn task() -> Task {
        Task {
            key: "abc".to_string(),
            status: TaskStatus::Todo,
            challenge: ChallengeRef {
                hash: "c".to_string(),
                metrics: ArtifactRef {
                    hash: "m".to_string(),
                    storage_address: "http://x/metrics".to_string(),
                    name: None,
                },
            },
            algo: ArtifactRef {
                hash: "a".to_string(),
                storage_address: "http://x/algo".to_string(),
                name: None,
            },
            start_model: Some(ArtifactRef {
                hash: "s".to_string(),
                storage_address: "http://x/start".to_string(),
                name: None,
            }),
            end_model: None,
            train_data: Some(DataRef {
                opener_hash: "o".to_string(),
                keys: vec!["d1".to_string()],
            }),
            test_data: None,
        }
    }

    #[test]
    fn test_phase_transitions() {
        assert_eq!(Phase::Training.status_filter(), TaskStatus::Todo);
        assert_eq!(Phase::Training.next_status(), TaskStatus::Training);
        assert_eq!(Phase::Testing.status_filter(), TaskStatus::Trained);
        assert_eq!(Phase::Testing.next_status(), TaskStatus::Testing);
    }

    #[test]
    fn test_refs_follow_phase() {
        let task = task();

        assert_eq!(Phase::Training.model_ref(&task).unwrap().hash, "s");
        assert_eq!(Phase::Training.data_ref(&task).unwrap().opener_hash, "o");

        let err = Phase::Testing.model_ref(&task).unwrap_err();
        assert_eq!(err.to_string(), "endModel 'abc' not found in local store");
        assert!(Phase::Testing.data_ref(&task).is_err());
    }

    #[test]
    fn test_parse_phase() {
        assert_eq!("train".parse::<Phase>().unwrap(), Phase::Training);
        assert_eq!("Testing".parse::<Phase>().unwrap(), Phase::Testing);
        assert!("predict".parse::<Phase>().is_err());
    }
}
