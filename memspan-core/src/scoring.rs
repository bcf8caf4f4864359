use crate::trial::NO_ANSWER_ACCURACY;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub correct: usize,
    pub accuracy: f64,
}

/// Scores a reproduction attempt against the `n` targets of the study matrix.
///
/// Answer order is irrelevant. Without any answer the accuracy is
/// [`NO_ANSWER_ACCURACY`], which keeps "timed out" apart from "all wrong".
pub fn score<T, A>(targets: &[T], answers: &[A], n: usize) -> Score
where
    T: AsRef<str>,
    A: AsRef<str>,
{
    let correct = targets
        .iter()
        .filter(|t| answers.iter().any(|a| a.as_ref() == t.as_ref()))
        .count();

    let accuracy = if answers.is_empty() {
        NO_ANSWER_ACCURACY
    } else if n == 0 {
        0.0
    } else {
        correct as f64 / n as f64
    };

    Score { correct, accuracy }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_answers_yields_sentinel() {
        let s = score(&["a", "b"], &[] as &[&str], 2);
        assert_eq!(s.correct, 0);
        assert_eq!(s.accuracy, -1.0);
    }

    #[test]
    fn wrong_but_attempted_is_zero() {
        let s = score(&["a", "b"], &["x"], 2);
        assert_eq!(s.correct, 0);
        assert_eq!(s.accuracy, 0.0);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = score(&["a", "b", "c", "d"], &["a", "c", "z"], 4);
        let reversed = score(&["a", "b", "c", "d"], &["z", "c", "a"], 4);
        assert_eq!(forward, reversed);
        assert_eq!(forward.correct, 2);
        assert_eq!(forward.accuracy, 0.5);
    }

    #[test]
    fn perfect_reproduction() {
        let s = score(&["q", "w", "e"], &["e", "w", "q"], 3);
        assert_eq!(s.correct, 3);
        assert_eq!(s.accuracy, 1.0);
    }
}
