use crate::config::ExperimentConfig;
use crate::participant::Sex;

/// Feedback messages for one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTexts {
    pub answer: String,
    pub no_answer: String,
}

impl FeedbackTexts {
    pub fn for_participant(config: &ExperimentConfig, sex: Sex) -> Self {
        let answer = match sex {
            Sex::Male => &config.fdbk_correctness_male,
            Sex::Female => &config.fdbk_correctness_female,
        };
        Self {
            answer: answer.clone(),
            no_answer: config.fdbk_no_answer.clone(),
        }
    }

    /// `correct` is `None` when nothing was selected. The first `{}` of the
    /// answer template takes the correct count, the second the target count.
    pub fn message(&self, correct: Option<usize>, n: usize) -> String {
        match correct {
            None => self.no_answer.clone(),
            Some(correct) => self
                .answer
                .replacen("{}", &correct.to_string(), 1)
                .replacen("{}", &n.to_string(), 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> FeedbackTexts {
        let config = ExperimentConfig {
            fdbk_correctness_male: "He got {} of {}".into(),
            fdbk_correctness_female: "She got {} of {}".into(),
            fdbk_no_answer: "Too slow".into(),
            ..ExperimentConfig::default()
        };
        FeedbackTexts::for_participant(&config, Sex::Female)
    }

    #[test]
    fn picks_template_by_sex() {
        assert_eq!(texts().answer, "She got {} of {}");
    }

    #[test]
    fn substitutes_counts_in_order() {
        assert_eq!(texts().message(Some(2), 5), "She got 2 of 5");
    }

    #[test]
    fn no_answer_uses_its_own_message() {
        assert_eq!(texts().message(None, 5), "Too slow");
    }
}
