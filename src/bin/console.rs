use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use eduai::clients::{GenerationClient, GeminiClient};
use eduai::controller::{AppController, ViewState};
use eduai::domain::{ChoiceKey, Curriculum, ExamType};
use eduai::gateway::GenerationGateway;
use eduai::selection::{EXAM_QUESTION_COUNTS, MIXED_QUESTION_COUNTS};
use eduai::transcript::FileTranscript;

#[derive(Parser)]
#[command(author, version, about = "📚 EduAI interactive study console", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    GEMINI_API_KEY  API key for the Gemini client (also read from .env)
    RUST_LOG        Log filter, e.g. eduai=debug")]
struct Args {
    /// Override the Gemini model name
    #[arg(short, long)]
    model: Option<String>,

    /// Save every prompt/response pair as markdown under this directory
    #[arg(short, long)]
    transcript: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    let mut client = GeminiClient::from_env().context("Gemini client setup failed")?;
    if let Some(model) = args.model {
        client = client.with_model(model);
    }
    let mut gateway = GenerationGateway::new(Box::new(client) as Box<dyn GenerationClient>);
    if let Some(dir) = args.transcript {
        gateway = gateway.with_transcript(Box::new(FileTranscript::new(dir)));
    }

    let mut app = AppController::new(Curriculum::bundled(), gateway);

    println!("📚 EduAI — Yapay Zeka Destekli Öğrenme Asistanı");
    loop {
        if let Some(notice) = app.notice() {
            println!("⚠️  {notice}");
        }
        match app.state() {
            ViewState::Selecting => {
                if !selection_screen(&mut app).await? {
                    break;
                }
            }
            ViewState::ConfiguringMixedQuiz => mixed_config_screen(&mut app).await?,
            ViewState::ConfiguringExamQuiz => exam_config_screen(&mut app).await?,
            ViewState::ShowingExplanation => explanation_screen(&mut app).await?,
            ViewState::ShowingQuiz => quiz_screen(&mut app)?,
            ViewState::ShowingResults => results_screen(&mut app)?,
            ViewState::Error => error_screen(&mut app).await?,
            // The controller only reports this mid-operation.
            ViewState::LoadingContent => unreachable!("loading resolves before input"),
        }
    }
    println!("Görüşmek üzere! 👋");
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label} ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Returns false when the user quits.
async fn selection_screen(app: &mut AppController) -> anyhow::Result<bool> {
    use eduai::selection::SingleTopicStep;

    let curriculum = app.curriculum().clone();
    match app.single_topic_flow().step() {
        SingleTopicStep::Grades => {
            println!("\nSınıfını seç:");
            for (i, grade) in curriculum.grades.iter().enumerate() {
                println!("  {}. {}", i + 1, grade.name);
            }
            println!("  k. Karışık Test   s. Deneme Sınavı   q. Çıkış");
            match prompt(">")?.as_str() {
                "q" => return Ok(false),
                "k" => app.configure_mixed_quiz(),
                "s" => {
                    println!("Sınav türü: 1. TYT  2. AYT  3. LGS");
                    let exam = match prompt(">")?.as_str() {
                        "1" => ExamType::Tyt,
                        "2" => ExamType::Ayt,
                        "3" => ExamType::Lgs,
                        _ => return Ok(true),
                    };
                    app.configure_exam_quiz(exam);
                }
                input => {
                    if let Some(grade) = pick(&curriculum.grades, input) {
                        let id = grade.id.clone();
                        let _ = app.select_grade(&id);
                    }
                }
            }
        }
        SingleTopicStep::Subjects => {
            let grade_id = app.single_topic_flow().grade_id().unwrap_or_default().to_string();
            let Some(grade) = curriculum.grade(&grade_id) else {
                app.back_to_grades();
                return Ok(true);
            };
            println!("\nDersini seç (b: geri):");
            for (i, subject) in grade.subjects.iter().enumerate() {
                println!("  {}. {}", i + 1, subject.name);
            }
            match prompt(">")?.as_str() {
                "b" => app.back_to_grades(),
                input => {
                    if let Some(subject) = pick(&grade.subjects, input) {
                        let id = subject.id.clone();
                        let _ = app.select_subject(&id);
                    }
                }
            }
        }
        SingleTopicStep::Topics => {
            let grade_id = app.single_topic_flow().grade_id().unwrap_or_default().to_string();
            let subject_id = app.single_topic_flow().subject_id().unwrap_or_default().to_string();
            let Some(subject) = curriculum.subject(&grade_id, &subject_id) else {
                app.back_to_subjects();
                return Ok(true);
            };
            println!("\nKonunu seç (b: geri):");
            for (i, topic) in subject.topics.iter().enumerate() {
                println!("  {}. {}", i + 1, topic.name);
            }
            match prompt(">")?.as_str() {
                "b" => app.back_to_subjects(),
                input => {
                    if let Some(topic) = pick(&subject.topics, input) {
                        let id = topic.id.clone();
                        println!("⏳ İçerik hazırlanıyor...");
                        app.select_topic(&id).await;
                    }
                }
            }
        }
    }
    Ok(true)
}

fn pick<'a, T>(items: &'a [T], input: &str) -> Option<&'a T> {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| items.get(i))
}

async fn mixed_config_screen(app: &mut AppController) -> anyhow::Result<()> {
    let curriculum = app.curriculum().clone();
    let grade_id = app.mixed_quiz_flow().grade_id().map(str::to_string);
    let subject_id = app.mixed_quiz_flow().subject_id().map(str::to_string);
    let all_topics = app.mixed_quiz_flow().all_topics();
    let selected = app.mixed_quiz_flow().selected_topic_ids().to_vec();
    let count = app.mixed_quiz_flow().question_count();

    if grade_id.is_none() {
        println!("\nKarışık test — sınıf seç (b: geri):");
        for (i, grade) in curriculum.grades.iter().enumerate() {
            println!("  {}. {}", i + 1, grade.name);
        }
        match prompt(">")?.as_str() {
            "b" => app.cancel_configuration(),
            input => {
                if let Some(grade) = pick(&curriculum.grades, input) {
                    let id = grade.id.clone();
                    let _ = app.mixed_select_grade(&id);
                }
            }
        }
        return Ok(());
    }
    let grade_id = grade_id.unwrap_or_default();
    if subject_id.is_none() {
        let Some(grade) = curriculum.grade(&grade_id) else {
            app.cancel_configuration();
            return Ok(());
        };
        println!("\nDers seç (b: geri):");
        for (i, subject) in grade.subjects.iter().enumerate() {
            println!("  {}. {}", i + 1, subject.name);
        }
        match prompt(">")?.as_str() {
            "b" => app.cancel_configuration(),
            input => {
                if let Some(subject) = pick(&grade.subjects, input) {
                    let id = subject.id.clone();
                    let _ = app.mixed_select_subject(&id);
                }
            }
        }
        return Ok(());
    }
    let subject_id = subject_id.unwrap_or_default();
    let Some(subject) = curriculum.subject(&grade_id, &subject_id) else {
        app.cancel_configuration();
        return Ok(());
    };
    println!("\nKonular (numara: seç/bırak, t: tüm konular {}):",
        if all_topics { "✓" } else { " " });
    for (i, topic) in subject.topics.iter().enumerate() {
        let mark = if selected.contains(&topic.id) { "✓" } else { " " };
        println!("  {}. [{}] {}", i + 1, mark, topic.name);
    }
    println!("Soru sayısı: {:?} (şu an {})", MIXED_QUESTION_COUNTS, count);
    println!("  n<sayı>: soru sayısı   g: başlat   b: vazgeç");
    let input = prompt(">")?;
    match input.as_str() {
        "b" => app.cancel_configuration(),
        "t" => app.mixed_toggle_all_topics(),
        "g" => {
            println!("⏳ Test hazırlanıyor...");
            app.start_mixed_quiz().await;
        }
        other => {
            if let Some(count) = other.strip_prefix('n').and_then(|v| v.parse().ok()) {
                let _ = app.mixed_set_question_count(count);
            } else if let Some(topic) = pick(&subject.topics, other) {
                let id = topic.id.clone();
                app.mixed_toggle_topic(&id);
            }
        }
    }
    Ok(())
}

async fn exam_config_screen(app: &mut AppController) -> anyhow::Result<()> {
    let name = app.exam_quiz_flow().exam_type().map(|e| e.exam_name()).unwrap_or("Deneme");
    let count = app.exam_quiz_flow().question_count();
    println!("\n{name} — soru sayısı: {:?} (şu an {})", EXAM_QUESTION_COUNTS, count);
    println!("  n<sayı>: soru sayısı   g: başlat   b: vazgeç");
    match prompt(">")?.as_str() {
        "b" => app.cancel_configuration(),
        "g" => {
            println!("⏳ Sınav hazırlanıyor...");
            app.start_exam_quiz().await;
        }
        other => {
            if let Some(count) = other.strip_prefix('n').and_then(|v| v.parse().ok()) {
                let _ = app.exam_set_question_count(count);
            }
        }
    }
    Ok(())
}

async fn explanation_screen(app: &mut AppController) -> anyhow::Result<()> {
    println!("\n──────── Konu Anlatımı ────────");
    println!("{}", app.explanation());
    println!("───────────────────────────────");
    println!("  d: teste geç   s: soru sor   o: çözümlü örnek   f: kavram kartları   r: baştan");
    match prompt(">")?.as_str() {
        "d" => app.proceed_to_quiz(),
        "r" => app.reset(),
        "s" => {
            let question = prompt("Sorun:")?;
            if !question.is_empty() {
                match app.ask_about_explanation(&question).await {
                    Ok(answer) => println!("\n💡 {answer}"),
                    Err(e) => println!("⚠️  {e}"),
                }
            }
        }
        "o" => match app.worked_example().await {
            Ok(example) => println!("\n{example}"),
            Err(e) => println!("⚠️  {e}"),
        },
        "f" => match app.flashcards().await {
            Ok(mut deck) => {
                while let Some(card) = deck.current().cloned() {
                    println!("\n[{}/{}] Ön: {}", deck.position() + 1, deck.len(), card.front);
                    if prompt("(enter: arka yüz, q: bitir)")?.as_str() == "q" {
                        break;
                    }
                    println!("Arka: {}", card.back);
                    if deck.position() + 1 == deck.len() {
                        break;
                    }
                    deck.next();
                }
            }
            Err(e) => println!("⚠️  {e}"),
        },
        _ => {}
    }
    Ok(())
}

fn quiz_screen(app: &mut AppController) -> anyhow::Result<()> {
    let snapshot = app.session().and_then(|session| {
        session
            .current()
            .map(|current| (session.cursor() + 1, session.len(), current.question.clone()))
    });
    let Some((index, total, question)) = snapshot else {
        app.reset();
        return Ok(());
    };
    println!("\nSoru {index}/{total}: {}", question.prompt_text);
    for (key, text) in &question.options {
        println!("  {}) {}", key, text);
    }
    let input = prompt("Cevabın (A-D):")?;
    match input.to_uppercase().parse::<ChoiceKey>() {
        Ok(choice) => {
            app.select_option(choice);
            app.advance();
        }
        Err(_) => println!("⚠️  A, B, C veya D girin."),
    }
    Ok(())
}

fn results_screen(app: &mut AppController) -> anyhow::Result<()> {
    let summary = app.score_summary();
    println!("\n🏁 Sonuçlar: {}/{} doğru (%{})", summary.correct, summary.total, summary.percentage);
    for topic in &summary.by_topic {
        println!("  {} — {}/{} (%{})", topic.label, topic.correct, topic.total, topic.percentage);
    }
    println!("\nYanlışların ve açıklamaları:");
    for question in app.results() {
        if question.is_correct == Some(true) {
            continue;
        }
        println!("\n  ✗ {}", question.question.prompt_text);
        println!("    Doğru cevap: {}", question.correct_key());
        println!("    {}", question.question.explanation);
    }
    println!("\n  r: baştan başla   q: çıkış");
    match prompt(">")?.as_str() {
        "q" => std::process::exit(0),
        _ => app.reset(),
    }
    Ok(())
}

async fn error_screen(app: &mut AppController) -> anyhow::Result<()> {
    println!("\n❌ {}", app.error_message().unwrap_or("Bilinmeyen hata."));
    println!("  t: tekrar dene   r: baştan başla");
    match prompt(">")?.as_str() {
        "t" => {
            println!("⏳ Tekrar deneniyor...");
            app.retry().await;
        }
        _ => app.reset(),
    }
    Ok(())
}
