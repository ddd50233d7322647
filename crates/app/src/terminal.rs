//! Terminal rendering and the interactive quiz loop.

use learn_core::LearnerState;
use learn_core::import::ImportProgress;
use learn_core::model::{CourseId, Lesson, LessonType, ModuleId};
use services::{
    ImportSummary, Notifier, QuizReport, QuizService, QuizSession, QuizTimer, Severity,
    TICK_PERIOD, TickReport,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prints notifications as tagged lines on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Success => " ok ",
            Severity::Warning => "warn",
            Severity::Error => "err ",
        };
        println!("[{tag}] {message}");
    }
}

pub fn print_progress(progress: ImportProgress) {
    eprintln!("  parsed {}/{} rows", progress.processed, progress.total);
}

pub fn print_import_summary(summary: &ImportSummary) {
    println!(
        "{} courses, {} modules, {} lessons, {} quizzes ({} rows skipped)",
        summary.courses, summary.modules, summary.lessons, summary.quizzes, summary.skipped_rows
    );
}

pub fn print_status(state: &LearnerState) {
    if state.is_empty() {
        println!("No courses loaded. Run `app import <file.csv>` first.");
        return;
    }
    for course in state.courses() {
        println!(
            "{} {} [{}] {}% ({}/{} lessons, {}/{} quizzes)",
            lock_mark(course.is_locked),
            course.title,
            course.id,
            course.progress_percent(),
            course.completed_lessons,
            course.total_lessons,
            course.completed_quizzes,
            course.total_quizzes
        );
        for module in &course.modules {
            println!(
                "   {} {} [{}] {}/{}",
                lock_mark(module.is_locked),
                module.title,
                module.id,
                module.completed_lessons,
                module.total_lessons
            );
            for lesson in &module.lessons {
                println!(
                    "      {} {} [{}] {} min",
                    if lesson.completed { "✓" } else { "·" },
                    lesson.title,
                    lesson.id,
                    lesson.duration
                );
            }
            if let Some(quiz) = &module.quiz {
                println!(
                    "      ? {} best {}% attempts {}/{}{}",
                    quiz.title,
                    quiz.best_score,
                    quiz.attempts,
                    quiz.max_attempts,
                    if quiz.passed { " passed" } else { "" }
                );
            }
        }
    }
}

fn lock_mark(locked: bool) -> &'static str {
    if locked { "🔒" } else { "  " }
}

pub fn print_lesson(lesson: &Lesson) {
    println!("{} ({}, {} min)", lesson.title, lesson.lesson_type(), lesson.duration);
    if !lesson.objectives.is_empty() {
        println!("Objectives:");
        for objective in &lesson.objectives {
            println!("  - {objective}");
        }
    }
    if lesson.lesson_type() == LessonType::Video {
        let url = lesson.kind.video_url().unwrap_or("(no usable link)");
        println!("Video: {url}");
    }
    if let Some(activity) = lesson.kind.interactive_content() {
        println!("{}: {}", activity.activity, activity.prompt);
        for (n, step) in activity.steps.iter().enumerate() {
            println!("  {}. {step}", n + 1);
        }
    }
    if !lesson.content.is_empty() {
        println!();
        println!("{}", lesson.content);
    }
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let index = session.current_index();
    println!();
    println!(
        "Question {}/{}: {}",
        index + 1,
        session.questions().len(),
        question.text
    );
    for (n, option) in question.options.iter().enumerate() {
        let mark = if session.answer(index) == Some(n) { '*' } else { ' ' };
        println!(" {mark}{}. {option}", n + 1);
    }
    println!("(1-{} answer, n next, p previous, s submit, q quit)", question.options.len());
}

fn print_report(report: &QuizReport) {
    let result = &report.result;
    println!();
    println!(
        "Score {}% ({}/{} correct){}",
        result.score,
        result.correct_count,
        result.total_questions,
        if result.auto_submitted { ", submitted when time ran out" } else { "" }
    );
    for (n, review) in result.review.iter().enumerate() {
        println!(
            "{} {}. {}",
            if review.is_correct { "✓" } else { "✗" },
            n + 1,
            review.question_text
        );
        println!("     your answer: {}", review.user_answer_label());
        if !review.is_correct {
            println!("     {}", review.explanation);
        }
    }
}

/// Run one quiz attempt against stdin with a live countdown.
///
/// # Errors
///
/// Returns any error from starting the quiz or applying its result.
pub async fn run_quiz(
    quizzes: &QuizService,
    state: &mut LearnerState,
    course_id: &CourseId,
    module_id: &ModuleId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = quizzes.start_quiz(state, course_id, module_id).await?;
    println!(
        "{}: {} questions, {} seconds",
        session.title(),
        session.questions().len(),
        session.time_remaining()
    );
    print_question(&session);

    let (timer, mut ticks) = QuizTimer::start(TICK_PERIOD);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let report = loop {
        tokio::select! {
            Some(_) = ticks.recv() => match quizzes.tick(state, &mut session).await? {
                TickReport::Expired(report) => break Some(report),
                TickReport::Running { remaining_secs } => {
                    if remaining_secs % 60 == 0 || remaining_secs <= 10 {
                        println!("  {remaining_secs}s left");
                    }
                }
                TickReport::Idle => break None,
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    quizzes.abandon(&mut session);
                    break None;
                };
                match line.trim() {
                    "s" => break quizzes.submit(state, &mut session).await?,
                    "q" => {
                        quizzes.abandon(&mut session);
                        break None;
                    }
                    "n" => {
                        session.next()?;
                        print_question(&session);
                    }
                    "p" => {
                        session.previous()?;
                        print_question(&session);
                    }
                    input => match input.parse::<usize>() {
                        Ok(choice) if choice > 0 => {
                            let index = session.current_index();
                            match session.select_answer(index, choice - 1) {
                                Ok(()) => {
                                    session.next()?;
                                    print_question(&session);
                                }
                                Err(err) => println!("{err}"),
                            }
                        }
                        _ => println!("unrecognised input: {input}"),
                    },
                }
            }
        }
    };
    timer.stop();

    if let Some(report) = report {
        print_report(&report);
    }
    Ok(())
}
