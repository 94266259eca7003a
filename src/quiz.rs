//! Quiz session and scoring: an ordered question set, a cursor, the user's
//! answers, and deterministic correctness computed exactly once at
//! submission.

use crate::domain::{ChoiceKey, ClientQuestion};

/// Fallback results bucket for questions without a topic label.
pub const UNLABELED_TOPIC: &str = "Bilinmeyen Konu/Ders";

/// Outcome of [`QuizSession::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the next question.
    Moved,
    /// The last question was answered; carries the finalized set.
    Finished(Vec<ClientQuestion>),
}

/// The in-progress question set. Questions are immutable apart from
/// `user_choice` during answering, and `is_correct` which is written once at
/// finalization.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<ClientQuestion>,
    cursor: usize,
    finished: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<ClientQuestion>) -> Self {
        Self { questions, cursor: 0, finished: false }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current(&self) -> Option<&ClientQuestion> {
        self.questions.get(self.cursor)
    }

    /// Record the user's choice on the current question only. No-op when the
    /// cursor is out of range.
    pub fn select_option(&mut self, choice: ChoiceKey) {
        if let Some(question) = self.questions.get_mut(self.cursor) {
            question.user_choice = Some(choice);
        }
    }

    /// The UI contract: advancing is blocked until the current question has
    /// an answer.
    pub fn can_advance(&self) -> bool {
        self.current().map(|q| q.user_choice.is_some()).unwrap_or(false)
    }

    /// Move the cursor, or finalize when it sits on the last question: every
    /// question gets `is_correct = (user_choice == correct_key)`, and the
    /// frozen set is emitted. An unanswered question is never correct.
    pub fn advance(&mut self) -> Advance {
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
            Advance::Moved
        } else {
            self.finished = true;
            for question in &mut self.questions {
                question.is_correct = Some(question.user_choice == Some(question.correct_key()));
            }
            Advance::Finished(self.questions.clone())
        }
    }
}

/// Per-topic slice of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScore {
    pub label: String,
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Aggregate scores over a finalized question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
    /// Grouped by topic label in first-seen order; unlabeled questions fall
    /// into the [`UNLABELED_TOPIC`] bucket.
    pub by_topic: Vec<TopicScore>,
}

fn ratio(correct: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((100.0 * correct as f64) / total as f64).round() as u32
    }
}

impl ScoreSummary {
    pub fn from_results(results: &[ClientQuestion]) -> Self {
        let correct = results.iter().filter(|q| q.is_correct == Some(true)).count();

        let mut by_topic: Vec<TopicScore> = Vec::new();
        for question in results {
            let label = question.topic_label().unwrap_or(UNLABELED_TOPIC);
            let entry = match by_topic.iter_mut().find(|t| t.label == label) {
                Some(entry) => entry,
                None => {
                    by_topic.push(TopicScore {
                        label: label.to_string(),
                        correct: 0,
                        total: 0,
                        percentage: 0,
                    });
                    by_topic.last_mut().expect("just pushed")
                }
            };
            entry.total += 1;
            if question.is_correct == Some(true) {
                entry.correct += 1;
            }
        }
        for entry in &mut by_topic {
            entry.percentage = ratio(entry.correct, entry.total);
        }

        Self { correct, total: results.len(), percentage: ratio(correct, results.len()), by_topic }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeneratedQuestion;

    fn question(correct: ChoiceKey, topic: Option<&str>) -> GeneratedQuestion {
        GeneratedQuestion {
            prompt_text: "soru".into(),
            options: ChoiceKey::ALL.iter().map(|k| (*k, k.to_string())).collect(),
            correct_key: correct,
            explanation: "açıklama".into(),
            topic_label: topic.map(str::to_string),
        }
    }

    fn session(setup: &[(ChoiceKey, Option<&str>)]) -> QuizSession {
        QuizSession::new(
            setup
                .iter()
                .enumerate()
                .map(|(i, (key, topic))| ClientQuestion::new("test", i, question(*key, *topic)))
                .collect(),
        )
    }

    #[test]
    fn select_option_writes_only_the_current_question() {
        let mut s = session(&[(ChoiceKey::A, None), (ChoiceKey::B, None)]);
        s.select_option(ChoiceKey::C);
        assert_eq!(s.current().unwrap().user_choice, Some(ChoiceKey::C));
        assert!(matches!(s.advance(), Advance::Moved));
        assert_eq!(s.current().unwrap().user_choice, None);
    }

    #[test]
    fn advancing_is_blocked_until_answered() {
        let mut s = session(&[(ChoiceKey::A, None)]);
        assert!(!s.can_advance());
        s.select_option(ChoiceKey::A);
        assert!(s.can_advance());
    }

    #[test]
    fn finalization_computes_correctness_for_every_question() {
        let mut s = session(&[(ChoiceKey::A, None), (ChoiceKey::B, None), (ChoiceKey::C, None)]);
        s.select_option(ChoiceKey::A); // correct
        s.advance();
        s.select_option(ChoiceKey::D); // wrong
        s.advance();
        // last question left unanswered
        let results = match s.advance() {
            Advance::Finished(results) => results,
            other => panic!("expected Finished, got {other:?}"),
        };
        assert!(s.is_finished());
        for q in &results {
            assert_eq!(q.is_correct, Some(q.user_choice == Some(q.correct_key())));
        }
        assert_eq!(
            results.iter().map(|q| q.is_correct).collect::<Vec<_>>(),
            vec![Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn unanswered_question_scores_as_incorrect() {
        let mut s = session(&[(ChoiceKey::A, None)]);
        let results = match s.advance() {
            Advance::Finished(results) => results,
            other => panic!("expected Finished, got {other:?}"),
        };
        assert_eq!(results[0].is_correct, Some(false));
    }

    #[test]
    fn summary_rounds_overall_percentage() {
        let mut s = session(&[
            (ChoiceKey::A, None),
            (ChoiceKey::A, None),
            (ChoiceKey::A, None),
        ]);
        s.select_option(ChoiceKey::A);
        s.advance();
        s.select_option(ChoiceKey::A);
        s.advance();
        s.select_option(ChoiceKey::B);
        let results = match s.advance() {
            Advance::Finished(r) => r,
            other => panic!("{other:?}"),
        };
        let summary = ScoreSummary::from_results(&results);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.percentage, 67); // round(66.67)
    }

    #[test]
    fn per_topic_breakdown_groups_in_first_seen_order() {
        let mut s = session(&[
            (ChoiceKey::A, Some("Üslü İfadeler")),
            (ChoiceKey::B, Some("Olasılık")),
            (ChoiceKey::C, Some("Üslü İfadeler")),
            (ChoiceKey::D, None),
        ]);
        s.select_option(ChoiceKey::A); // Üslü correct
        s.advance();
        s.select_option(ChoiceKey::A); // Olasılık wrong
        s.advance();
        s.select_option(ChoiceKey::C); // Üslü correct
        s.advance();
        let results = match s.advance() {
            Advance::Finished(r) => r,
            other => panic!("{other:?}"),
        };

        let summary = ScoreSummary::from_results(&results);
        let labels: Vec<&str> = summary.by_topic.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["Üslü İfadeler", "Olasılık", UNLABELED_TOPIC]);
        assert_eq!(summary.by_topic[0].correct, 2);
        assert_eq!(summary.by_topic[0].percentage, 100);
        assert_eq!(summary.by_topic[1].percentage, 0);
        assert_eq!(summary.by_topic[2].total, 1);
    }

    #[test]
    fn empty_result_set_scores_zero() {
        let summary = ScoreSummary::from_results(&[]);
        assert_eq!(summary.percentage, 0);
        assert!(summary.by_topic.is_empty());
    }
}
