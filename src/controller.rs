//! The view-state controller: one state machine driving the whole session,
//! from curriculum selection through content generation to quiz results.
//!
//! All generation calls funnel through here so the pending-operation tag,
//! the busy window and the error/retry path stay in one place.

use tracing::{debug, info, instrument, warn};

use crate::domain::{ChoiceKey, ClientQuestion, Curriculum, ExamType, FlashcardDeck};
use crate::error::{ActionError, GenerationError, ValidationError};
use crate::gateway::GenerationGateway;
use crate::quiz::{Advance, QuizSession, ScoreSummary};
use crate::selection::{
    ExamQuizFlow, GenerationRequest, MixedQuizFlow, MixedQuizRequest, ResolvedTopic,
    SingleTopicFlow,
};

/// Every screen the front end can show. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Selecting,
    ConfiguringMixedQuiz,
    ConfiguringExamQuiz,
    LoadingContent,
    ShowingExplanation,
    ShowingQuiz,
    ShowingResults,
    Error,
}

/// Seam for presentation-layer transition effects. The controller calls the
/// hook synchronously between leaving one state and entering the next; the
/// controller reports itself busy for the duration.
pub trait TransitionHook: Send + Sync {
    fn on_transition(&self, _from: ViewState, _to: ViewState) {}
}

/// Default hook: transitions are instantaneous.
#[derive(Debug, Default)]
pub struct NoopHook;

impl TransitionHook for NoopHook {}

/// Owns the full session context and mediates every state change.
pub struct AppController {
    curriculum: Curriculum,
    gateway: GenerationGateway,
    hook: Box<dyn TransitionHook>,
    state: ViewState,
    in_transition: bool,
    single: SingleTopicFlow,
    mixed: MixedQuizFlow,
    exam: ExamQuizFlow,
    explanation: String,
    current_topic: Option<ResolvedTopic>,
    session: Option<QuizSession>,
    results: Vec<ClientQuestion>,
    error: Option<String>,
    notice: Option<String>,
    pending: Option<GenerationRequest>,
}

impl AppController {
    pub fn new(curriculum: Curriculum, gateway: GenerationGateway) -> Self {
        Self {
            curriculum,
            gateway,
            hook: Box::new(NoopHook),
            state: ViewState::Selecting,
            in_transition: false,
            single: SingleTopicFlow::default(),
            mixed: MixedQuizFlow::default(),
            exam: ExamQuizFlow::default(),
            explanation: String::new(),
            current_topic: None,
            session: None,
            results: Vec::new(),
            error: None,
            notice: None,
            pending: None,
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn TransitionHook>) -> Self {
        self.hook = hook;
        self
    }

    // -- read access for the presentation layer --------------------------------

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// True while content is being generated or a transition hook is running.
    /// The UI disables anything that could double-trigger an operation.
    pub fn busy(&self) -> bool {
        self.state == ViewState::LoadingContent || self.in_transition
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Inline validation message for the current configuration screen.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn current_topic(&self) -> Option<&ResolvedTopic> {
        self.current_topic.as_ref()
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn results(&self) -> &[ClientQuestion] {
        &self.results
    }

    pub fn score_summary(&self) -> ScoreSummary {
        ScoreSummary::from_results(&self.results)
    }

    pub fn single_topic_flow(&self) -> &SingleTopicFlow {
        &self.single
    }

    pub fn mixed_quiz_flow(&self) -> &MixedQuizFlow {
        &self.mixed
    }

    pub fn exam_quiz_flow(&self) -> &ExamQuizFlow {
        &self.exam
    }

    pub fn pending_request(&self) -> Option<&GenerationRequest> {
        self.pending.as_ref()
    }

    // -- selection -------------------------------------------------------------

    pub fn select_grade(&mut self, grade_id: &str) -> Result<(), ValidationError> {
        self.notice = None;
        self.single.select_grade(&self.curriculum, grade_id)
    }

    pub fn select_subject(&mut self, subject_id: &str) -> Result<(), ValidationError> {
        self.notice = None;
        self.single.select_subject(&self.curriculum, subject_id)
    }

    /// Picking a topic completes the path and immediately starts generation.
    pub async fn select_topic(&mut self, topic_id: &str) {
        if let Err(e) = self.single.select_topic(&self.curriculum, topic_id) {
            self.notice = Some(e.to_string());
            return;
        }
        self.start_learning().await;
    }

    pub fn back_to_grades(&mut self) {
        self.notice = None;
        self.single.back_to_grades();
    }

    pub fn back_to_subjects(&mut self) {
        self.notice = None;
        self.single.back_to_subjects();
    }

    pub fn configure_mixed_quiz(&mut self) {
        self.notice = None;
        self.mixed.reset();
        self.transition(ViewState::ConfiguringMixedQuiz);
    }

    pub fn configure_exam_quiz(&mut self, exam_type: ExamType) {
        self.notice = None;
        self.exam.reset();
        self.exam.select_exam(exam_type);
        self.transition(ViewState::ConfiguringExamQuiz);
    }

    pub fn mixed_select_grade(&mut self, grade_id: &str) -> Result<(), ValidationError> {
        self.notice = None;
        self.mixed.select_grade(&self.curriculum, grade_id)
    }

    pub fn mixed_select_subject(&mut self, subject_id: &str) -> Result<(), ValidationError> {
        self.notice = None;
        self.mixed.select_subject(&self.curriculum, subject_id)
    }

    pub fn mixed_toggle_topic(&mut self, topic_id: &str) {
        self.notice = None;
        self.mixed.toggle_topic(topic_id);
    }

    pub fn mixed_toggle_all_topics(&mut self) {
        self.notice = None;
        self.mixed.toggle_all_topics();
    }

    pub fn mixed_set_question_count(&mut self, count: usize) -> Result<(), ValidationError> {
        self.notice = None;
        self.mixed.set_question_count(count)
    }

    pub fn exam_set_question_count(&mut self, count: usize) -> Result<(), ValidationError> {
        self.notice = None;
        self.exam.set_question_count(count)
    }

    /// Leave a configuration screen without generating anything.
    pub fn cancel_configuration(&mut self) {
        if matches!(
            self.state,
            ViewState::ConfiguringMixedQuiz | ViewState::ConfiguringExamQuiz
        ) {
            self.notice = None;
            self.transition(ViewState::Selecting);
        }
    }

    // -- generation entry points -----------------------------------------------

    /// Resolve the single-topic path and fetch explanation and questions
    /// together. A validation failure is an inline notice; the view does not
    /// change and nothing is fetched.
    #[instrument(skip(self))]
    pub async fn start_learning(&mut self) {
        let resolved = match self.single.resolve(&self.curriculum) {
            Ok(r) => r,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        self.notice = None;
        self.pending = Some(GenerationRequest::SingleTopic(resolved.clone()));
        self.transition(ViewState::LoadingContent);
        self.run_single_topic(resolved).await;
    }

    #[instrument(skip(self))]
    pub async fn start_mixed_quiz(&mut self) {
        let request = match self.mixed.resolve(&self.curriculum) {
            Ok(r) => r,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        self.notice = None;
        self.pending = Some(GenerationRequest::MixedQuiz(request.clone()));
        self.transition(ViewState::LoadingContent);
        self.run_mixed_quiz(request).await;
    }

    #[instrument(skip(self))]
    pub async fn start_exam_quiz(&mut self) {
        let request = match self.exam.resolve() {
            Ok(r) => r,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        let (exam_type, count) = match request {
            GenerationRequest::ExamQuiz { exam_type, count } => (exam_type, count),
            _ => unreachable!("exam flow resolves to an exam request"),
        };
        self.notice = None;
        self.pending = Some(GenerationRequest::ExamQuiz { exam_type, count });
        self.transition(ViewState::LoadingContent);
        self.run_exam_quiz(exam_type, count).await;
    }

    /// Re-issue the operation recorded in the pending tag. With no tag the
    /// failure predates any generation attempt, so fall back to a full reset.
    #[instrument(skip(self))]
    pub async fn retry(&mut self) {
        let Some(pending) = self.pending.clone() else {
            info!("retry with no pending operation, resetting");
            self.reset();
            return;
        };
        self.error = None;
        self.transition(ViewState::LoadingContent);
        match pending {
            GenerationRequest::SingleTopic(resolved) => self.run_single_topic(resolved).await,
            GenerationRequest::MixedQuiz(request) => self.run_mixed_quiz(request).await,
            GenerationRequest::ExamQuiz { exam_type, count } => {
                self.run_exam_quiz(exam_type, count).await
            }
        }
    }

    /// Clear the whole session context and return to the selection screen.
    /// Valid from any state.
    pub fn reset(&mut self) {
        self.single.reset();
        self.mixed.reset();
        self.exam.reset();
        self.explanation.clear();
        self.current_topic = None;
        self.session = None;
        self.results.clear();
        self.error = None;
        self.notice = None;
        self.pending = None;
        self.transition(ViewState::Selecting);
    }

    // -- quiz flow -------------------------------------------------------------

    pub fn proceed_to_quiz(&mut self) {
        if self.state == ViewState::ShowingExplanation && self.session.is_some() {
            self.transition(ViewState::ShowingQuiz);
        }
    }

    pub fn select_option(&mut self, choice: ChoiceKey) {
        if self.state != ViewState::ShowingQuiz {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.select_option(choice);
        }
    }

    /// Advance to the next question, or finalize and show results on the
    /// last one. Without a recorded choice the quiz stays put and asks for
    /// one.
    pub fn advance(&mut self) {
        if self.state != ViewState::ShowingQuiz {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.can_advance() {
            self.notice = Some("Lütfen bir seçenek işaretleyin.".to_string());
            return;
        }
        self.notice = None;
        match session.advance() {
            Advance::Moved => {}
            Advance::Finished(results) => {
                info!(total = results.len(), "quiz finished");
                self.results = results;
                self.session = None;
                self.transition(ViewState::ShowingResults);
            }
        }
    }

    // -- explanation extras ----------------------------------------------------

    /// Answer a student question in the context of the current explanation.
    /// Leaves the view state untouched.
    pub async fn ask_about_explanation(
        &self,
        user_question: &str,
    ) -> Result<String, ActionError> {
        let topic = self.active_topic()?;
        let answer = self
            .gateway
            .fetch_contextual_answer(
                &self.explanation,
                user_question,
                &topic.grade_name,
                &topic.subject_name,
                &topic.topic_name,
            )
            .await?;
        Ok(answer)
    }

    /// Step-by-step worked example for the current explanation.
    pub async fn worked_example(&self) -> Result<String, ActionError> {
        let topic = self.active_topic()?;
        let example = self
            .gateway
            .fetch_worked_example(
                &topic.grade_name,
                &topic.subject_name,
                &topic.topic_name,
                &self.explanation,
            )
            .await?;
        Ok(example)
    }

    /// Key-concept flashcards for the current explanation.
    pub async fn flashcards(&self) -> Result<FlashcardDeck, ActionError> {
        let topic = self.active_topic()?;
        let cards = self
            .gateway
            .fetch_flashcards(
                &topic.grade_name,
                &topic.subject_name,
                &topic.topic_name,
                &self.explanation,
            )
            .await?;
        Ok(FlashcardDeck::new(cards))
    }

    fn active_topic(&self) -> Result<&ResolvedTopic, ValidationError> {
        self.current_topic
            .as_ref()
            .ok_or_else(|| ValidationError::new("Önce bir konu anlatımı görüntüleyin."))
    }

    // -- internals -------------------------------------------------------------

    fn transition(&mut self, next: ViewState) {
        let from = self.state;
        debug!(?from, to = ?next, "view transition");
        self.in_transition = true;
        self.hook.on_transition(from, next);
        self.state = next;
        self.in_transition = false;
    }

    fn fail(&mut self, error: GenerationError) {
        warn!(error = %error, "generation failed");
        self.error = Some(error.to_string());
        self.transition(ViewState::Error);
    }

    async fn run_single_topic(&mut self, resolved: ResolvedTopic) {
        let (explanation, questions) = tokio::join!(
            self.gateway.fetch_explanation(
                &resolved.grade_name,
                &resolved.subject_name,
                &resolved.topic_name,
            ),
            self.gateway.fetch_questions(
                &resolved.grade_name,
                &resolved.subject_name,
                &resolved.topic_name,
            ),
        );
        // All-or-nothing: a failure on either leg discards the other.
        match (explanation, questions) {
            (Ok(explanation), Ok(questions)) => {
                let questions = questions
                    .into_iter()
                    .enumerate()
                    .map(|(i, q)| ClientQuestion::new(&resolved.topic_id, i, q))
                    .collect();
                self.explanation = explanation;
                self.session = Some(QuizSession::new(questions));
                self.current_topic = Some(resolved);
                self.pending = None;
                self.transition(ViewState::ShowingExplanation);
            }
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
    }

    async fn run_mixed_quiz(&mut self, request: MixedQuizRequest) {
        let result = self
            .gateway
            .fetch_mixed_quiz(
                &request.grade_name,
                &request.subject_name,
                &request.topics,
                request.count,
            )
            .await;
        match result {
            Ok(questions) => {
                let tag = format!("mixed-{}", request.subject_id);
                self.install_quiz(&tag, questions);
            }
            Err(e) => self.fail(e),
        }
    }

    async fn run_exam_quiz(&mut self, exam_type: ExamType, count: usize) {
        match self.gateway.fetch_exam_quiz(exam_type, count).await {
            Ok(questions) => self.install_quiz(exam_type.code(), questions),
            Err(e) => self.fail(e),
        }
    }

    fn install_quiz(&mut self, mode_tag: &str, questions: Vec<crate::domain::GeneratedQuestion>) {
        let questions = questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| ClientQuestion::new(mode_tag, i, q))
            .collect();
        self.session = Some(QuizSession::new(questions));
        self.pending = None;
        self.transition(ViewState::ShowingQuiz);
    }
}
