use crate::infra::{
    seeded_criteria, seeded_directory, seeded_tokens, InMemoryEvaluationRepository,
    LoggingNotificationPublisher, DEV_EMPLOYEE_TOKEN, DEV_MANAGER_TOKEN,
};
use abz_portal::error::AppError;
use abz_portal::performance::{
    EvaluationChanges, EvaluationDraft, EvaluationService, EvaluationServiceError,
    EvaluationStatus, EvaluationView, RatingDraft,
};
use chrono::{Datelike, Duration, Local};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Period label for the demo evaluation (defaults to the current quarter)
    #[arg(long)]
    period: Option<String>,
}

/// Scripted walkthrough of the evaluation workflow against the same
/// in-memory stack the `serve` command uses.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let notifications = Arc::new(LoggingNotificationPublisher);
    let service = EvaluationService::new(
        repository,
        notifications,
        Arc::new(seeded_criteria()),
        Arc::new(seeded_directory()),
        Arc::new(seeded_tokens()),
    );

    let manager = service
        .authenticate(Some(DEV_MANAGER_TOKEN))
        .ok_or(EvaluationServiceError::Unauthenticated)?;
    let employee = service
        .authenticate(Some(DEV_EMPLOYEE_TOKEN))
        .ok_or(EvaluationServiceError::Unauthenticated)?;

    let today = Local::now().date_naive();
    let period = args
        .period
        .unwrap_or_else(|| format!("{}-Q{}", today.year(), (today.month0() / 3) + 1));

    let rating = |criterion: &str, value: f64, comment: &str| RatingDraft {
        criterion: criterion.to_string(),
        value: Some(value),
        comment: Some(comment.to_string()),
    };

    let draft = EvaluationDraft {
        subject: "Ana Souza".to_string(),
        evaluator: "Carlos Braga".to_string(),
        period: period.clone(),
        start_date: today - Duration::days(90),
        end_date: today,
        notes: Some("Scripted demo evaluation".to_string()),
        ratings: vec![
            rating("crit-productivity", 4.0, "Consistent delivery"),
            rating("crit-quality", 4.0, "Low rework rate"),
            rating("Communication", 5.0, "Clear status updates"),
            rating("legacy-attitude", 3.0, "Carried from the old system"),
        ],
    };

    let created = service.create(Some(&manager), draft)?;
    println!("ABZ portal evaluation demo");
    println!("Period {period}, subject Ana Souza, evaluated by Carlos Braga\n");
    render_view("Created (manager view)", &created);

    for status in [EvaluationStatus::InProgress, EvaluationStatus::Completed] {
        service.update(
            Some(&manager),
            &created.id,
            EvaluationChanges {
                status: Some(status),
                ..EvaluationChanges::default()
            },
        )?;
    }

    let own = service.get(Some(&employee), &created.id)?;
    render_view("Completed (subject view)", &own);

    Ok(())
}

fn render_view(title: &str, view: &EvaluationView) {
    println!("{title}");
    println!("- status: {}", view.status.label());
    match view.total_score {
        Some(total) => println!("- total score: {total:.2}"),
        None => println!("- total score: —"),
    }
    println!("- evaluator: {}", view.evaluator.name);
    match view.created_at {
        Some(created_at) => println!("- created at: {created_at}"),
        None => println!("- created at: —"),
    }
    for rating in &view.ratings {
        println!(
            "  * {} ({}): {:.1} × weight {:.1} = {:.1}",
            rating.criterion_name,
            rating.category,
            rating.value,
            rating.weight,
            rating.weighted
        );
    }
    println!();
}
