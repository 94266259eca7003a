//! Domain records shared across the session: curriculum reference data, quiz
//! questions in their generated and client-side forms, flashcards, and exam
//! categories.
//!
//! Wire field names (`soru`, `secenekler`, `dogruCevap`, `aciklama`, `konuAdi`,
//! `front`, `back`) follow the generation-service contract; everything else is
//! crate-internal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Answer choice key. Every generated question carries exactly these four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChoiceKey {
    A,
    B,
    C,
    D,
}

impl ChoiceKey {
    pub const ALL: [ChoiceKey; 4] = [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceKey::A => "A",
            ChoiceKey::B => "B",
            ChoiceKey::C => "C",
            ChoiceKey::D => "D",
        }
    }
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoiceKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(ChoiceKey::A),
            "B" => Ok(ChoiceKey::B),
            "C" => Ok(ChoiceKey::C),
            "D" => Ok(ChoiceKey::D),
            _ => Err(()),
        }
    }
}

/// A validated multiple-choice question as produced by the response
/// normalizer. Immutable once created; `options` always holds exactly the four
/// choice keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "soru")]
    pub prompt_text: String,
    #[serde(rename = "secenekler")]
    pub options: BTreeMap<ChoiceKey, String>,
    #[serde(rename = "dogruCevap")]
    pub correct_key: ChoiceKey,
    #[serde(rename = "aciklama")]
    pub explanation: String,
    /// Topic name for mixed quizzes, subject name for exam quizzes, absent for
    /// single-topic quizzes.
    #[serde(rename = "konuAdi", skip_serializing_if = "Option::is_none")]
    pub topic_label: Option<String>,
}

/// A question instance owned by a quiz session: the generated question plus a
/// session-unique id and the user's answer state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientQuestion {
    pub id: String,
    pub question: GeneratedQuestion,
    pub user_choice: Option<ChoiceKey>,
    /// Computed exactly once, at submission.
    pub is_correct: Option<bool>,
}

impl ClientQuestion {
    /// Wrap a generated question with a deterministic id of the form
    /// `{mode_tag}-q-{index}`.
    pub fn new(mode_tag: &str, index: usize, question: GeneratedQuestion) -> Self {
        Self {
            id: format!("{mode_tag}-q-{index}"),
            question,
            user_choice: None,
            is_correct: None,
        }
    }

    pub fn correct_key(&self) -> ChoiceKey {
        self.question.correct_key
    }

    pub fn topic_label(&self) -> Option<&str> {
        self.question.topic_label.as_deref()
    }
}

/// One study card. Both faces are non-empty by normalizer guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// Read cursor over an immutable flashcard collection.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    cards: Vec<Flashcard>,
    cursor: usize,
}

impl FlashcardDeck {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self { cards, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.cursor)
    }

    /// Advance the cursor; saturates at the last card.
    pub fn next(&mut self) -> Option<&Flashcard> {
        if self.cursor + 1 < self.cards.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Step the cursor back; saturates at the first card.
    pub fn prev(&mut self) -> Option<&Flashcard> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }
}

/// Standardized exam category for mock-exam quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    Tyt,
    Ayt,
    Lgs,
}

impl ExamType {
    pub const ALL: [ExamType; 3] = [ExamType::Tyt, ExamType::Ayt, ExamType::Lgs];

    /// Short code used in question ids and UI labels.
    pub fn code(&self) -> &'static str {
        match self {
            ExamType::Tyt => "TYT",
            ExamType::Ayt => "AYT",
            ExamType::Lgs => "LGS",
        }
    }

    /// Full exam name used in prompts.
    pub fn exam_name(&self) -> &'static str {
        match self {
            ExamType::Tyt => "TYT (Temel Yeterlilik Testi)",
            ExamType::Ayt => "AYT (Alan Yeterlilik Testi)",
            ExamType::Lgs => "LGS (Liselere Geçiş Sistemi)",
        }
    }

    /// Per-exam subject mix embedded in the prompt.
    pub fn subjects_prompt_part(&self) -> &'static str {
        match self {
            ExamType::Tyt => {
                "Türkçe, Sosyal Bilimler (Tarih, Coğrafya, Felsefe, Din Kültürü ve Ahlak Bilgisi), \
                 Temel Matematik ve Fen Bilimleri (Fizik, Kimya, Biyoloji) derslerinden TYT formatına \
                 uygun ve bu dersler arasında dengeli bir dağılımla"
            }
            ExamType::Ayt => {
                "Matematik, Fen Bilimleri (Fizik, Kimya, Biyoloji), Türk Dili ve \
                 Edebiyatı-Sosyal Bilimler-1 (Tarih-1, Coğrafya-1), Sosyal Bilimler-2 (Tarih-2, \
                 Coğrafya-2, Felsefe Grubu, Din Kültürü ve Ahlak Bilgisi) derslerinden AYT formatına \
                 uygun (genel bir alan karması) ve bu dersler arasında dengeli bir dağılımla"
            }
            ExamType::Lgs => {
                "Türkçe, Matematik, Fen Bilimleri, T.C. İnkılap Tarihi ve Atatürkçülük, Din Kültürü \
                 ve Ahlak Bilgisi ve Yabancı Dil (İngilizce) derslerinden LGS formatına uygun ve bu \
                 dersler arasında dengeli bir dağılımla"
            }
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which topics a mixed-topic quiz draws from: every topic of the subject, or
/// an explicit non-empty set of topic names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicScope {
    All,
    Named(Vec<String>),
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TYT" => Ok(ExamType::Tyt),
            "AYT" => Ok(ExamType::Ayt),
            "LGS" => Ok(ExamType::Lgs),
            other => Err(format!("unknown exam type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Curriculum reference tree (read-only, loaded once at startup)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub name: String,
    pub subjects: Vec<Subject>,
}

/// The full grade → subject → topic tree. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum {
    pub grades: Vec<Grade>,
}

impl Curriculum {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The sample curriculum shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json(include_str!("../data/curriculum.json"))
            .expect("bundled curriculum is valid JSON")
    }

    pub fn grade(&self, grade_id: &str) -> Option<&Grade> {
        self.grades.iter().find(|g| g.id == grade_id)
    }

    pub fn subject(&self, grade_id: &str, subject_id: &str) -> Option<&Subject> {
        self.grade(grade_id)?.subjects.iter().find(|s| s.id == subject_id)
    }

    pub fn topic(&self, grade_id: &str, subject_id: &str, topic_id: &str) -> Option<&Topic> {
        self.subject(grade_id, subject_id)?.topics.iter().find(|t| t.id == topic_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cards() -> Vec<Flashcard> {
        vec![
            Flashcard { front: "Üslü sayı".into(), back: "Tekrarlı çarpımın kısa yazımı".into() },
            Flashcard { front: "Taban".into(), back: "Çarpılmakta olan sayı".into() },
        ]
    }

    #[test]
    fn choice_key_round_trips_through_str() {
        for key in ChoiceKey::ALL {
            assert_eq!(key.as_str().parse::<ChoiceKey>(), Ok(key));
        }
        assert!("E".parse::<ChoiceKey>().is_err());
    }

    #[test]
    fn client_question_id_is_deterministic() {
        let q = GeneratedQuestion {
            prompt_text: "2^3 kaçtır?".into(),
            options: ChoiceKey::ALL
                .iter()
                .map(|k| (*k, format!("seçenek {k}")))
                .collect(),
            correct_key: ChoiceKey::B,
            explanation: "2^3 = 8".into(),
            topic_label: None,
        };
        let cq = ClientQuestion::new("m8-t3", 4, q);
        assert_eq!(cq.id, "m8-t3-q-4");
        assert_eq!(cq.user_choice, None);
        assert_eq!(cq.is_correct, None);
    }

    #[test]
    fn flashcard_deck_cursor_saturates_at_both_ends() {
        let mut deck = FlashcardDeck::new(sample_cards());
        assert_eq!(deck.position(), 0);
        assert_eq!(deck.prev().map(|c| c.front.as_str()), Some("Üslü sayı"));
        deck.next();
        assert_eq!(deck.position(), 1);
        assert_eq!(deck.next().map(|c| c.front.as_str()), Some("Taban"));
        assert_eq!(deck.position(), 1);
    }

    #[test]
    fn empty_deck_has_no_current_card() {
        let mut deck = FlashcardDeck::new(Vec::new());
        assert!(deck.is_empty());
        assert!(deck.current().is_none());
        assert!(deck.next().is_none());
    }

    #[test]
    fn curriculum_lookups_follow_the_tree() {
        let curriculum = Curriculum::from_json(
            r#"[{"id":"g8","name":"8. Sınıf","subjects":[
                {"id":"mat","name":"Matematik","topics":[{"id":"uslu","name":"Üslü Sayılar"}]}
            ]}]"#,
        )
        .unwrap();
        assert_eq!(curriculum.grade("g8").unwrap().name, "8. Sınıf");
        assert_eq!(curriculum.subject("g8", "mat").unwrap().topics.len(), 1);
        assert_eq!(curriculum.topic("g8", "mat", "uslu").unwrap().name, "Üslü Sayılar");
        assert!(curriculum.topic("g8", "mat", "yok").is_none());
        assert!(curriculum.grade("g9").is_none());
    }

    #[test]
    fn bundled_curriculum_parses() {
        let curriculum = Curriculum::bundled();
        assert!(!curriculum.grades.is_empty());
        for grade in &curriculum.grades {
            assert!(!grade.subjects.is_empty(), "grade {} has no subjects", grade.id);
        }
    }
}
