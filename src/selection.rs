//! Selection model: three independent flows over the curriculum tree, each a
//! small step machine that produces a fully resolved [`GenerationRequest`]
//! once the user completes a path.
//!
//! Every "back" transition discards the state collected at and after the step
//! being left, so stale selections never survive a path change.

use crate::domain::{Curriculum, ExamType, TopicScope};
use crate::error::ValidationError;

/// Question-count menu for exam quizzes.
pub const EXAM_QUESTION_COUNTS: [usize; 7] = [5, 10, 15, 20, 25, 30, 40];
/// Question-count menu for mixed quizzes (exam menu capped at 20).
pub const MIXED_QUESTION_COUNTS: [usize; 4] = [5, 10, 15, 20];

pub const DEFAULT_MIXED_COUNT: usize = 10;
pub const DEFAULT_EXAM_COUNT: usize = 20;

fn unknown_selection() -> ValidationError {
    ValidationError::new("Geçersiz seçim.")
}

/// A fully resolved single-topic path with the display names the gateway
/// prompts need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopic {
    pub grade_id: String,
    pub subject_id: String,
    pub topic_id: String,
    pub grade_name: String,
    pub subject_name: String,
    pub topic_name: String,
}

/// A fully resolved mixed-quiz configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedQuizRequest {
    pub subject_id: String,
    pub grade_name: String,
    pub subject_name: String,
    pub topics: TopicScope,
    pub count: usize,
}

/// The explicit pending-operation tag: everything needed to (re-)issue one
/// generation action. Set before each call, cleared on success, and the sole
/// input to error-state retry.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    SingleTopic(ResolvedTopic),
    MixedQuiz(MixedQuizRequest),
    ExamQuiz { exam_type: ExamType, count: usize },
}

// ---------------------------------------------------------------------------
// Single-topic flow: grades -> subjects -> topics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingleTopicStep {
    #[default]
    Grades,
    Subjects,
    Topics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleTopicFlow {
    step: SingleTopicStep,
    grade_id: Option<String>,
    subject_id: Option<String>,
    topic_id: Option<String>,
}

impl SingleTopicFlow {
    pub fn step(&self) -> SingleTopicStep {
        self.step
    }

    pub fn grade_id(&self) -> Option<&str> {
        self.grade_id.as_deref()
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn topic_id(&self) -> Option<&str> {
        self.topic_id.as_deref()
    }

    pub fn select_grade(&mut self, curriculum: &Curriculum, grade_id: &str) -> Result<(), ValidationError> {
        curriculum.grade(grade_id).ok_or_else(unknown_selection)?;
        self.grade_id = Some(grade_id.to_string());
        self.subject_id = None;
        self.topic_id = None;
        self.step = SingleTopicStep::Subjects;
        Ok(())
    }

    pub fn select_subject(&mut self, curriculum: &Curriculum, subject_id: &str) -> Result<(), ValidationError> {
        let grade_id = self.grade_id.as_deref().ok_or_else(unknown_selection)?;
        curriculum.subject(grade_id, subject_id).ok_or_else(unknown_selection)?;
        self.subject_id = Some(subject_id.to_string());
        self.topic_id = None;
        self.step = SingleTopicStep::Topics;
        Ok(())
    }

    /// Selecting a topic completes the path; there is no separate confirm
    /// step, the controller starts generation right away.
    pub fn select_topic(&mut self, curriculum: &Curriculum, topic_id: &str) -> Result<(), ValidationError> {
        let grade_id = self.grade_id.as_deref().ok_or_else(unknown_selection)?;
        let subject_id = self.subject_id.as_deref().ok_or_else(unknown_selection)?;
        curriculum.topic(grade_id, subject_id, topic_id).ok_or_else(unknown_selection)?;
        self.topic_id = Some(topic_id.to_string());
        Ok(())
    }

    pub fn back_to_grades(&mut self) {
        *self = Self::default();
    }

    pub fn back_to_subjects(&mut self) {
        self.subject_id = None;
        self.topic_id = None;
        self.step = SingleTopicStep::Subjects;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn resolve(&self, curriculum: &Curriculum) -> Result<ResolvedTopic, ValidationError> {
        let incomplete = || ValidationError::new("Lütfen tüm seçimleri yapınız.");
        let grade_id = self.grade_id.as_deref().ok_or_else(incomplete)?;
        let subject_id = self.subject_id.as_deref().ok_or_else(incomplete)?;
        let topic_id = self.topic_id.as_deref().ok_or_else(incomplete)?;
        let grade = curriculum.grade(grade_id).ok_or_else(incomplete)?;
        let subject = curriculum.subject(grade_id, subject_id).ok_or_else(incomplete)?;
        let topic = curriculum.topic(grade_id, subject_id, topic_id).ok_or_else(incomplete)?;
        Ok(ResolvedTopic {
            grade_id: grade.id.clone(),
            subject_id: subject.id.clone(),
            topic_id: topic.id.clone(),
            grade_name: grade.name.clone(),
            subject_name: subject.name.clone(),
            topic_name: topic.name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Mixed-topic flow: grade -> subject -> topics + count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixedQuizStep {
    #[default]
    Grade,
    Subject,
    TopicsCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedQuizFlow {
    step: MixedQuizStep,
    grade_id: Option<String>,
    subject_id: Option<String>,
    selected_topic_ids: Vec<String>,
    all_topics: bool,
    question_count: usize,
}

impl Default for MixedQuizFlow {
    fn default() -> Self {
        Self {
            step: MixedQuizStep::Grade,
            grade_id: None,
            subject_id: None,
            selected_topic_ids: Vec::new(),
            all_topics: true,
            question_count: DEFAULT_MIXED_COUNT,
        }
    }
}

impl MixedQuizFlow {
    pub fn step(&self) -> MixedQuizStep {
        self.step
    }

    pub fn grade_id(&self) -> Option<&str> {
        self.grade_id.as_deref()
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn all_topics(&self) -> bool {
        self.all_topics
    }

    pub fn selected_topic_ids(&self) -> &[String] {
        &self.selected_topic_ids
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn select_grade(&mut self, curriculum: &Curriculum, grade_id: &str) -> Result<(), ValidationError> {
        curriculum.grade(grade_id).ok_or_else(unknown_selection)?;
        self.grade_id = Some(grade_id.to_string());
        self.subject_id = None;
        self.selected_topic_ids.clear();
        self.all_topics = true;
        self.step = MixedQuizStep::Subject;
        Ok(())
    }

    pub fn select_subject(&mut self, curriculum: &Curriculum, subject_id: &str) -> Result<(), ValidationError> {
        let grade_id = self.grade_id.as_deref().ok_or_else(unknown_selection)?;
        curriculum.subject(grade_id, subject_id).ok_or_else(unknown_selection)?;
        self.subject_id = Some(subject_id.to_string());
        self.selected_topic_ids.clear();
        self.all_topics = true;
        self.step = MixedQuizStep::TopicsCount;
        Ok(())
    }

    /// Toggle one topic in or out of the selection. Any individual pick
    /// clears the all-topics flag.
    pub fn toggle_topic(&mut self, topic_id: &str) {
        match self.selected_topic_ids.iter().position(|id| id == topic_id) {
            Some(pos) => {
                self.selected_topic_ids.remove(pos);
            }
            None => self.selected_topic_ids.push(topic_id.to_string()),
        }
        self.all_topics = false;
    }

    /// Flip the all-topics flag. Turning it on empties the individual picks.
    pub fn toggle_all_topics(&mut self) {
        self.all_topics = !self.all_topics;
        if self.all_topics {
            self.selected_topic_ids.clear();
        }
    }

    pub fn set_question_count(&mut self, count: usize) -> Result<(), ValidationError> {
        if !MIXED_QUESTION_COUNTS.contains(&count) {
            return Err(ValidationError::new("Geçersiz soru sayısı."));
        }
        self.question_count = count;
        Ok(())
    }

    pub fn back_to_grade(&mut self) {
        let count = self.question_count;
        *self = Self::default();
        self.question_count = count;
    }

    pub fn back_to_subject(&mut self) {
        self.subject_id = None;
        self.selected_topic_ids.clear();
        self.all_topics = true;
        self.step = MixedQuizStep::Subject;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn resolve(&self, curriculum: &Curriculum) -> Result<MixedQuizRequest, ValidationError> {
        let incomplete = || {
            ValidationError::new(
                "Karışık test için lütfen sınıf, ders ve en az bir konu seçin veya 'Tüm Konular'ı işaretleyin.",
            )
        };
        let grade_id = self.grade_id.as_deref().ok_or_else(incomplete)?;
        let subject_id = self.subject_id.as_deref().ok_or_else(incomplete)?;
        let grade = curriculum.grade(grade_id).ok_or_else(incomplete)?;
        let subject = curriculum.subject(grade_id, subject_id).ok_or_else(incomplete)?;

        let topics = if self.all_topics {
            TopicScope::All
        } else {
            // Topic names in curriculum order, restricted to the picked ids.
            let names: Vec<String> = subject
                .topics
                .iter()
                .filter(|t| self.selected_topic_ids.contains(&t.id))
                .map(|t| t.name.clone())
                .collect();
            if names.is_empty() {
                return Err(incomplete());
            }
            TopicScope::Named(names)
        };

        Ok(MixedQuizRequest {
            subject_id: subject.id.clone(),
            grade_name: grade.name.clone(),
            subject_name: subject.name.clone(),
            topics,
            count: self.question_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Exam flow: exam category + count, no curriculum drill-down
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamQuizFlow {
    exam_type: Option<ExamType>,
    question_count: usize,
}

impl Default for ExamQuizFlow {
    fn default() -> Self {
        Self { exam_type: None, question_count: DEFAULT_EXAM_COUNT }
    }
}

impl ExamQuizFlow {
    pub fn exam_type(&self) -> Option<ExamType> {
        self.exam_type
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn select_exam(&mut self, exam_type: ExamType) {
        self.exam_type = Some(exam_type);
    }

    pub fn set_question_count(&mut self, count: usize) -> Result<(), ValidationError> {
        if !EXAM_QUESTION_COUNTS.contains(&count) {
            return Err(ValidationError::new("Geçersiz soru sayısı."));
        }
        self.question_count = count;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn resolve(&self) -> Result<GenerationRequest, ValidationError> {
        let exam_type = self
            .exam_type
            .ok_or_else(|| ValidationError::new("Lütfen bir sınav türü seçin."))?;
        Ok(GenerationRequest::ExamQuiz { exam_type, count: self.question_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curriculum() -> Curriculum {
        Curriculum::from_json(
            r#"[{"id":"g8","name":"8. Sınıf","subjects":[
                {"id":"mat","name":"Matematik","topics":[
                    {"id":"uslu","name":"Üslü İfadeler"},
                    {"id":"karekok","name":"Kareköklü İfadeler"},
                    {"id":"olasilik","name":"Olasılık"}
                ]},
                {"id":"fen","name":"Fen Bilimleri","topics":[{"id":"basinc","name":"Basınç"}]}
            ]}]"#,
        )
        .unwrap()
    }

    #[test]
    fn single_topic_flow_walks_the_tree() {
        let c = curriculum();
        let mut flow = SingleTopicFlow::default();
        assert_eq!(flow.step(), SingleTopicStep::Grades);
        flow.select_grade(&c, "g8").unwrap();
        assert_eq!(flow.step(), SingleTopicStep::Subjects);
        flow.select_subject(&c, "mat").unwrap();
        flow.select_topic(&c, "uslu").unwrap();

        let resolved = flow.resolve(&c).unwrap();
        assert_eq!(resolved.topic_name, "Üslü İfadeler");
        assert_eq!(resolved.grade_name, "8. Sınıf");
    }

    #[test]
    fn single_topic_rejects_unknown_ids() {
        let c = curriculum();
        let mut flow = SingleTopicFlow::default();
        assert!(flow.select_grade(&c, "g99").is_err());
        flow.select_grade(&c, "g8").unwrap();
        assert!(flow.select_subject(&c, "tarih").is_err());
    }

    #[test]
    fn single_topic_back_discards_later_steps() {
        let c = curriculum();
        let mut flow = SingleTopicFlow::default();
        flow.select_grade(&c, "g8").unwrap();
        flow.select_subject(&c, "mat").unwrap();
        flow.select_topic(&c, "uslu").unwrap();

        flow.back_to_subjects();
        assert_eq!(flow.grade_id(), Some("g8"));
        assert_eq!(flow.subject_id(), None);
        assert_eq!(flow.topic_id(), None);
        assert!(flow.resolve(&c).is_err());

        flow.back_to_grades();
        assert_eq!(flow.grade_id(), None);
        assert_eq!(flow.step(), SingleTopicStep::Grades);
    }

    #[test]
    fn unresolved_single_topic_path_is_a_validation_error() {
        let c = curriculum();
        let flow = SingleTopicFlow::default();
        let err = flow.resolve(&c).unwrap_err();
        assert_eq!(err.message, "Lütfen tüm seçimleri yapınız.");
    }

    #[test]
    fn mixed_all_topics_and_individual_picks_are_mutually_exclusive() {
        let c = curriculum();
        let mut flow = MixedQuizFlow::default();
        flow.select_grade(&c, "g8").unwrap();
        flow.select_subject(&c, "mat").unwrap();
        assert!(flow.all_topics());

        flow.toggle_topic("uslu");
        assert!(!flow.all_topics());
        assert_eq!(flow.selected_topic_ids(), ["uslu"]);

        flow.toggle_all_topics();
        assert!(flow.all_topics());
        assert!(flow.selected_topic_ids().is_empty());

        flow.toggle_topic("karekok");
        flow.toggle_topic("karekok");
        assert!(!flow.all_topics());
        assert!(flow.selected_topic_ids().is_empty());
    }

    #[test]
    fn mixed_resolve_requires_all_or_at_least_one_topic() {
        let c = curriculum();
        let mut flow = MixedQuizFlow::default();
        flow.select_grade(&c, "g8").unwrap();
        flow.select_subject(&c, "mat").unwrap();

        // all_topics=false with no picks must fail before any request exists.
        flow.toggle_topic("uslu");
        flow.toggle_topic("uslu");
        assert!(flow.resolve(&c).is_err());

        flow.toggle_topic("olasilik");
        flow.toggle_topic("uslu");
        let request = flow.resolve(&c).unwrap();
        // Names come out in curriculum order, not pick order.
        assert_eq!(
            request.topics,
            TopicScope::Named(vec!["Üslü İfadeler".into(), "Olasılık".into()])
        );
        assert_eq!(request.count, DEFAULT_MIXED_COUNT);
    }

    #[test]
    fn mixed_subject_change_clears_topic_picks() {
        let c = curriculum();
        let mut flow = MixedQuizFlow::default();
        flow.select_grade(&c, "g8").unwrap();
        flow.select_subject(&c, "mat").unwrap();
        flow.toggle_topic("uslu");

        flow.select_subject(&c, "fen").unwrap();
        assert!(flow.all_topics());
        assert!(flow.selected_topic_ids().is_empty());
        assert_eq!(flow.resolve(&c).unwrap().subject_name, "Fen Bilimleri");
    }

    #[test]
    fn mixed_count_menu_is_enforced() {
        let mut flow = MixedQuizFlow::default();
        assert!(flow.set_question_count(15).is_ok());
        assert!(flow.set_question_count(25).is_err());
        assert_eq!(flow.question_count(), 15);
    }

    #[test]
    fn exam_flow_resolves_with_defaults() {
        let mut flow = ExamQuizFlow::default();
        assert!(flow.resolve().is_err());
        flow.select_exam(ExamType::Tyt);
        assert_eq!(
            flow.resolve().unwrap(),
            GenerationRequest::ExamQuiz { exam_type: ExamType::Tyt, count: DEFAULT_EXAM_COUNT }
        );
        assert!(flow.set_question_count(40).is_ok());
        assert!(flow.set_question_count(35).is_err());
    }
}
