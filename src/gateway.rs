//! Generation gateway: one typed async operation per content kind.
//!
//! Each operation builds the service's natural-language instruction payload,
//! invokes the client exactly once (retry belongs to the caller), and pipes
//! the raw text through the response normalizer. Structured-output mode is
//! requested whenever a list of records is expected.

use tracing::{info, instrument, warn};

use crate::clients::GenerationClient;
use crate::clients::GeminiClient;
use crate::domain::{ExamType, Flashcard, GeneratedQuestion, TopicScope};
use crate::error::GenerationError;
use crate::normalize::{normalize_explanation, normalize_flashcards, normalize_question_list};
use crate::transcript::TranscriptSink;

/// Number of questions requested per single-topic call.
pub const QUESTIONS_PER_TOPIC: usize = 5;

pub struct GenerationGateway {
    client: Box<dyn GenerationClient>,
    transcript: Option<Box<dyn TranscriptSink>>,
}

impl GenerationGateway {
    pub fn new(client: Box<dyn GenerationClient>) -> Self {
        Self { client, transcript: None }
    }

    /// Gateway over a Gemini client configured from the environment. Fails
    /// with a configuration error when the credential is absent, before any
    /// network call is possible.
    pub fn from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(Box::new(GeminiClient::from_env()?)))
    }

    pub fn with_transcript(mut self, sink: Box<dyn TranscriptSink>) -> Self {
        self.transcript = Some(sink);
        self
    }

    async fn generate(&self, prompt: String, structured: bool) -> Result<String, GenerationError> {
        let response = self.client.generate(prompt.clone(), structured).await?;
        if let Some(sink) = &self.transcript {
            if let Err(e) = sink.save(&prompt, &response).await {
                warn!(error = %e, "failed to save generation transcript");
            }
        }
        Ok(response)
    }

    /// Detailed topic explanation, free text with markdown/LaTeX markup left
    /// to the renderer.
    #[instrument(skip(self))]
    pub async fn fetch_explanation(
        &self,
        grade: &str,
        subject: &str,
        topic: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "{grade}, {subject} dersi, '{topic}' konusu için ayrıntılı bir konu anlatımı oluştur. \
             Anlatım, bu seviyedeki bir öğrencinin anlayabileceği şekilde açık ve net olmalı. \
             Örnekler ve önemli noktaları vurgula. Başlıkları markdown kullanarak belirgin \
             yapabilirsin (örneğin ## Başlık). Konu anlatımı içindeki metinlerde yeni satır \
             karakterlerini \\n olarak kaçırdığından emin ol."
        );
        let raw = self.generate(prompt, false).await?;
        info!(len = raw.len(), "fetched topic explanation");
        Ok(normalize_explanation(&raw))
    }

    /// Fixed-size multiple-choice question set for one topic.
    #[instrument(skip(self))]
    pub async fn fetch_questions(
        &self,
        grade: &str,
        subject: &str,
        topic: &str,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        let prompt = format!(
            "{grade}, {subject} dersi, '{topic}' konusuyla ilgili {QUESTIONS_PER_TOPIC} adet çoktan \
             seçmeli test sorusu oluştur.\n\
             Her soru için 4 seçenek (A, B, C, D) olmalıdır.\n\
             Her soru için doğru cevabı ve doğru cevabın kısa bir açıklamasını da belirt.\n\
             Sorular, konunun anlaşılıp anlaşılmadığını ölçmelidir.\n\
             {JSON_FORMAT_INSTRUCTIONS}"
        );
        let raw = self.generate(prompt, true).await?;
        let questions = normalize_question_list(&raw, false)?;
        info!(count = questions.len(), "fetched topic questions");
        Ok(questions)
    }

    /// Quiz drawn from several (or all) topics of one subject. Every question
    /// must carry the topic it belongs to for the per-topic results
    /// breakdown.
    #[instrument(skip(self, topics))]
    pub async fn fetch_mixed_quiz(
        &self,
        grade: &str,
        subject: &str,
        topics: &TopicScope,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        let topics_part = match topics {
            TopicScope::All => "bu dersteki tüm konulardan rastgele ve dengeli bir dağılımla".to_string(),
            TopicScope::Named(names) => format!("'{}' konularından", names.join("', '")),
        };
        let prompt = format!(
            "{grade} {subject} dersi için, {topics_part} toplam {count} adet çoktan seçmeli test \
             sorusu oluştur.\n\
             Her soru için 4 seçenek (A, B, C, D) olmalıdır.\n\
             Her soru için doğru cevabı ve doğru cevabın kısa bir açıklamasını da belirt.\n\
             Sorular, belirtilen konuların anlaşılıp anlaşılmadığını ölçmelidir.\n\
             ÇOK ÖNEMLİ: Her soru objesinde, o sorunun ait olduğu spesifik konunun adını içeren \
             bir \"konuAdi\" alanı ekle. Örneğin, \"konuAdi\": \"Üslü Sayılar\".\n\
             {JSON_FORMAT_INSTRUCTIONS}"
        );
        let raw = self.generate(prompt, true).await?;
        let questions = normalize_question_list(&raw, true)?;
        info!(count = questions.len(), "fetched mixed quiz");
        Ok(questions)
    }

    /// Mock-exam quiz across the subject mix of a standardized exam. Every
    /// question carries its subject as the topic label.
    #[instrument(skip(self))]
    pub async fn fetch_exam_quiz(
        &self,
        exam_type: ExamType,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        let prompt = format!(
            "Bir {exam_name} deneme sınavı için, {subjects_part} toplam {count} adet çoktan seçmeli \
             test sorusu oluştur.\n\
             Her soru için 4 seçenek (A, B, C, D) olmalıdır.\n\
             Her soru için doğru cevabı ve doğru cevabın kısa bir açıklamasını da belirt.\n\
             Sorular, belirtilen sınavın genel kapsamını ve zorluk seviyesini yansıtmalıdır.\n\
             ÇOK ÖNEMLİ: Her soru objesinde, o sorunun ait olduğu dersin veya alanın adını içeren \
             bir \"konuAdi\" alanı ekle. Örneğin, \"konuAdi\": \"Temel Matematik\".\n\
             {JSON_FORMAT_INSTRUCTIONS}",
            exam_name = exam_type.exam_name(),
            subjects_part = exam_type.subjects_prompt_part(),
        );
        let raw = self.generate(prompt, true).await?;
        let questions = normalize_question_list(&raw, true)?;
        info!(count = questions.len(), "fetched exam quiz");
        Ok(questions)
    }

    /// Free-text answer to a student question asked in the context of an
    /// explanation.
    #[instrument(skip(self, explanation, question))]
    pub async fn fetch_contextual_answer(
        &self,
        explanation: &str,
        question: &str,
        grade: &str,
        subject: &str,
        topic: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "Bir öğrenci, {grade} {subject} dersi, '{topic}' konusu hakkındaki aşağıdaki konu \
             anlatımıyla ilgili bir soru sordu.\n\
             Öğrencinin sorusu: \"{question}\"\n\n\
             Lütfen bu soruya, öncelikle aşağıda verilen konu anlatımı bağlamında kalarak, \
             öğrencinin seviyesine uygun, açık, net ve yardımcı bir cevap verin. Eğer soru konu \
             anlatımının dışındaysa, bunu belirtin ve genel bilgi verin.\n\
             Cevabınızdaki metinlerde yeni satır karakterlerini \\n olarak kaçırdığınızdan emin olun.\n\n\
             Konu Anlatımı:\n---\n{explanation}\n---\nCevap:"
        );
        let raw = self.generate(prompt, false).await?;
        Ok(normalize_explanation(&raw))
    }

    /// Free-text step-by-step worked example building on an explanation.
    #[instrument(skip(self, explanation))]
    pub async fn fetch_worked_example(
        &self,
        grade: &str,
        subject: &str,
        topic: &str,
        explanation: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "Bir öğrenci {grade} {subject} dersi, '{topic}' konusunu daha iyi anlamak için adım adım \
             çözümlü bir örnek görmek istiyor. Mevcut konu anlatımı şudur:\n\n\
             ---\n{explanation}\n---\n\n\
             Lütfen bu konuyla ilgili, öğrencinin seviyesine uygun, tipik bir problem veya soru \
             oluşturun. Ardından, bu problemin çözümünü, her bir adımı net bir şekilde açıklayarak, \
             adım adım sunun. Çözümü Markdown formatında, örneğin \"### Problem:\", \
             \"#### Çözüm Adımları:\", \"**Adım 1:**\" gibi başlıklar kullanarak düzenleyin. \
             Cevabınızdaki metinlerde yeni satır karakterlerini \\n olarak kaçırdığınızdan emin olun."
        );
        let raw = self.generate(prompt, false).await?;
        Ok(normalize_explanation(&raw))
    }

    /// Key-concept flashcards derived from an explanation.
    #[instrument(skip(self, explanation))]
    pub async fn fetch_flashcards(
        &self,
        grade: &str,
        subject: &str,
        topic: &str,
        explanation: &str,
    ) -> Result<Vec<Flashcard>, GenerationError> {
        let prompt = format!(
            "{grade} {subject} dersi, '{topic}' konusu ve aşağıdaki konu anlatımı bağlamında 5 ila 8 \
             adet anahtar kavram kartı (flashcard) oluşturun.\n\
             Her kartın bir \"ön yüzü\" (anahtar terim, kısa bir soru veya önemli bir başlık) ve bir \
             \"arka yüzü\" (tanım, cevap veya kısa bir açıklama) olmalıdır.\n\
             Kartlar, konunun en önemli noktalarını ve terimlerini içermelidir.\n\
             Cevapları aşağıdaki JSON formatında bir dizi olarak verin. JSON içindeki tüm string \
             değerlerde yeni satır karakterlerinin \\n olarak doğru bir şekilde kaçırıldığından emin ol:\n\
             [\n  {{\"front\": \"Ön yüz metni\", \"back\": \"Arka yüz metni\"}}\n]\n\
             JSON yanıtının başına veya sonuna kesinlikle markdown veya başka bir metin ekleme.\n\
             Konu Anlatımı:\n---\n{explanation}\n---"
        );
        let raw = self.generate(prompt, true).await?;
        let cards = normalize_flashcards(&raw)?;
        info!(count = cards.len(), "fetched flashcards");
        Ok(cards)
    }
}

/// Shared tail of every question-list prompt: the expected JSON shape plus
/// escaping rules.
const JSON_FORMAT_INSTRUCTIONS: &str = "Cevapları aşağıdaki JSON formatında bir dizi olarak ver. \
JSON içindeki tüm string değerlerde yeni satır karakterlerinin \\n olarak, tırnak işaretlerinin \
\\\" olarak ve ters eğik çizgilerin \\\\ olarak doğru bir şekilde kaçırıldığından emin ol:\n\
[\n  {\n    \"soru\": \"Soru metni burada...\",\n    \"secenekler\": {\n      \"A\": \"A seçeneği\",\n      \
\"B\": \"B seçeneği\",\n      \"C\": \"C seçeneği\",\n      \"D\": \"D seçeneği\"\n    },\n    \
\"dogruCevap\": \"A\",\n    \"aciklama\": \"Bu cevabın doğru olmasının nedeni...\",\n    \
\"konuAdi\": \"Konu Adı Burada\"\n  }\n]\n\
JSON yanıtının başına veya sonuna kesinlikle markdown (```json ... ```) veya başka bir metin \
ekleme. Sadece geçerli JSON dizisi döndür.";
