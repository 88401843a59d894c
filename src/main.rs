use chrono::{NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;

use housekeeping_planning_core::domain::activity::{ActivityClassification, GovernanceActivity, WorkloadDriver};
use housekeeping_planning_core::domain::rules::{generate_rule_code, Rigidity, Rule, RuleKind, RuleOwner};
use housekeeping_planning_core::domain::sector::{ContractVariant, Employee, Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::trace::{AgentRun, RunStatus, RunType, TraceSink};
use housekeeping_planning_core::engines::{assignment, demand, forecast, rules as rule_engine, schedule};
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

/// Runs the housekeeping labor-planning pipeline end to end against an
/// in-memory data-lake store, seeding a demo sector for a single week.
#[derive(Parser, Debug)]
#[command(name = "housekeeping-planner", about = "Housekeeping demand/schedule planning pipeline")]
struct Cli {
    /// Total rooms in the demo sector.
    #[arg(long, default_value_t = 120)]
    rooms: i32,

    /// ISO week-start date (Monday) to plan for, e.g. 2026-08-03.
    #[arg(long)]
    week_start: Option<String>,
}

async fn seed_sector(store: &Store, total_rooms: i32) -> housekeeping_planning_core::ids::SectorId {
    let sector_id = store.insert_sector(Sector::new("Housekeeping - Tower A", total_rooms)).await;
    store.set_sector_params(SectorOperationalParameters::default_for(sector_id, total_rooms)).await;

    for (name, role, hours) in [("Ana Silva", "room_attendant", 40.0), ("Bruno Costa", "room_attendant", 40.0), ("Carla Dias", "room_attendant", 32.0), ("Diego Alves", "room_attendant", 40.0)] {
        let mut employee = Employee::new(sector_id, name, role, ContractVariant::Permanent, hours);
        employee.specializations.insert("morning".into());
        store.insert_employee(employee).await;
    }

    store.insert_activity(GovernanceActivity::new(sector_id, "Vacant-dirty clean", "VD_CLEAN", 25.0, WorkloadDriver::Variable, ActivityClassification::CalculatedByAgent, 2)).await;
    store.insert_activity(GovernanceActivity::new(sector_id, "Stayover clean", "SO_CLEAN", 10.0, WorkloadDriver::Variable, ActivityClassification::CalculatedByAgent, 1)).await;
    store.insert_activity(GovernanceActivity::new(sector_id, "Daily supply restock", "RESTOCK", 15.0, WorkloadDriver::Constant, ActivityClassification::CalculatedByAgent, 1)).await;

    let global_rest = Rule {
        owner: RuleOwner::Global,
        kind: RuleKind::Labor,
        rigidity: Rigidity::Mandatory,
        priority: 1,
        active: true,
        validity_start: None,
        validity_end: None,
        title: "Minimum rest between shifts".into(),
        question: "What is the minimum rest between shifts?".into(),
        answer: "11 hours".into(),
        metadata: serde_json::json!({ "min_rest_between_shifts_hours": 11.0 }),
        code: generate_rule_code("Minimum rest between shifts", RuleKind::Labor, RuleOwner::Global),
        deleted_at: None,
    };
    let _ = store.insert_rule(global_rest).await;

    sector_id
}

async fn run_pipeline(store: &Store, sector_id: housekeeping_planning_core::ids::SectorId, week_start: NaiveDate) -> housekeeping_planning_core::error::Result<()> {
    let now = Utc::now();
    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::FullPipeline, now);
    let rule_snapshot = rule_engine::get_constraints(store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.expect("seeded above");
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));

    let prerequisites = forecast::check_prerequisites(store, sector_id).await;
    if prerequisites.blocks_baseline() {
        println!("{}", "forecast prerequisites not met; proceeding with zeros for missing occupancy history".yellow());
    }

    let run_id = forecast::create_baseline(store, sector_id, week_start, now, &mut ctx).await?;
    forecast::lock(store, run_id, now).await?;
    println!("{} forecast run {:?} locked for week starting {}", "==>".green().bold(), run_id, week_start);

    demand::compute_and_persist_for_run(store, &mut ctx, run_id).await;
    println!("{} demand computed for 7 days", "==>".green().bold());

    let plan_id = schedule::generate_plan(store, &mut ctx, run_id, week_start, housekeeping_planning_core::domain::schedule::SchedulePlanKind::Baseline, None, &[]).await?;
    println!("{} schedule plan {:?} generated", "==>".green().bold(), plan_id);

    let violations = assignment::assign(store, &mut ctx, sector_id, plan_id).await?;
    if violations.is_empty() {
        println!("{} all slots assigned with no rule warnings", "==>".green().bold());
    } else {
        println!("{} assignment produced {} warning(s)", "==>".yellow().bold(), violations.len());
    }

    let entries = schedule::validate_legal(store, plan_id, &ctx.rule_snapshot, now).await?;
    let errors = entries.iter().filter(|e| e.severity == housekeeping_planning_core::domain::rules::Severity::Error).count();
    println!("{} legal validation: {} entries ({} blocking)", "==>".green().bold(), entries.len(), errors);

    for step in agent_run.ordered_steps() {
        log::debug!("[{}] {}", step.step_key, step.description);
    }
    agent_run.finish(RunStatus::Success, Utc::now());
    store.insert_agent_run(agent_run).await;

    Ok(())
}

#[tokio::main]
async fn main() {
    housekeeping_planning_core::logger::init();
    let cli = Cli::parse();

    let week_start = cli
        .week_start
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| {
            let today = Utc::now().date_naive();
            today - chrono::Duration::days(chrono::Datelike::weekday(&today).num_days_from_monday() as i64)
        });

    let store = Store::new();
    let sector_id = seed_sector(&store, cli.rooms).await;

    match run_pipeline(&store, sector_id, week_start).await {
        Ok(()) => println!("{}", "pipeline completed successfully".green().bold()),
        Err(err) => {
            eprintln!("{} {}", "pipeline failed:".red().bold(), err);
            std::process::exit(1);
        }
    }
}
