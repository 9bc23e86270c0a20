//! Interactive lesson quiz on stdin/stdout.

use services::{AdvanceOutcome, LessonSessionLoop, Notifier, PendingPersistence};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use toeic_core::model::{LessonId, OptionKey, User};

use crate::print_notifications;

type Input = Lines<BufReader<Stdin>>;

/// Run one lesson from open to completion. Returns early if stdin closes,
/// which discards the session without saving anything.
pub async fn run(
    loop_svc: &LessonSessionLoop,
    lesson_id: LessonId,
    user: Option<&User>,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = loop_svc.notifier();
    let page = loop_svc.open_lesson(lesson_id).await;
    print_notifications(notifier);

    let (Some(lesson), Some(mut session)) = (page.lesson.data(), page.session) else {
        return Ok(());
    };

    println!("# {}", lesson.title);
    for video in &lesson.videos {
        println!("  video: {} ({})", video.title, video.embed_url());
    }
    if let Some(theory) = &lesson.theory {
        println!();
        println!("{theory}");
    }
    if session.is_complete() {
        println!("This lesson has no exercises.");
        return Ok(());
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<PendingPersistence> = None;

    while let Some(exercise) = session.current_exercise() {
        println!();
        println!(
            "[{}/{}] {}",
            session.current_index() + 1,
            session.total(),
            exercise.question()
        );
        for key in OptionKey::ALL {
            println!("  {key}. {}", exercise.option(key));
        }

        let feedback = loop {
            let Some(choice) = prompt(&mut input, "answer (A-D)").await? else {
                println!("lesson abandoned");
                return Ok(());
            };
            session.select_option(choice)?;
            match loop_svc.submit_answer(&mut session) {
                Ok(feedback) => break feedback,
                Err(err) if err.is_validation() => print_notifications(notifier),
                Err(err) => return Err(err.into()),
            }
        };

        if feedback.is_correct {
            println!("correct!");
        } else {
            println!("wrong, the answer is {}", feedback.correct_option);
        }
        if !feedback.explanation.is_empty() {
            println!("  {}", feedback.explanation);
        }

        if let AdvanceOutcome::Completed { summary, persistence } =
            loop_svc.advance(&mut session, user)?
        {
            println!();
            println!(
                "score: {}/{} ({}%)",
                summary.score.correct,
                summary.score.total,
                summary.percent()
            );
            pending = Some(persistence);
        }
    }

    print_notifications(notifier);
    if let Some(persistence) = pending {
        finish_writes(persistence, notifier).await;
    }
    Ok(())
}

async fn finish_writes(persistence: PendingPersistence, notifier: &Notifier) {
    if persistence.is_attempted() {
        let report = persistence.wait().await;
        tracing::debug!(?report, "completion writes settled");
        print_notifications(notifier);
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, std::io::Error> {
    println!("{label}: ");
    let Some(line) = input.next_line().await? else {
        return Ok(None);
    };
    // Option buttons always send upper-case keys.
    Ok(Some(line.trim().to_uppercase()))
}
