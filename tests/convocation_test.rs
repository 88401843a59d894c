use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use housekeeping_planning_core::domain::convocation::{ConvocationOrigin, ConvocationStatus};
use housekeeping_planning_core::domain::rules::{Rigidity, Rule, RuleKind, RuleOwner};
use housekeeping_planning_core::domain::sector::{ContractVariant, Employee, Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::engines::convocation::{self, CreateConvocationInput};
use housekeeping_planning_core::engines::rules as rule_engine;
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

#[tokio::test]
async fn declining_a_convocation_chains_a_reschedule_successor() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    store.set_sector_params(SectorOperationalParameters::default_for(sector_id, 100)).await;
    let employee_id = store.insert_employee(Employee::new(sector_id, "Ana Silva", "room_attendant", ContractVariant::Intermittent, 40.0)).await;

    let now = Utc::now();
    let week_start = now.date_naive();
    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::Convocations, now);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));

    let shift_date = (now + Duration::days(5)).date_naive();
    let input = CreateConvocationInput {
        employee_id,
        sector_id,
        date: shift_date,
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        break_minutes: 30,
        origin: ConvocationOrigin::Baseline,
        response_hours: None,
    };
    let outcome = convocation::create(&store, &mut ctx, input).await.unwrap();
    assert!(outcome.is_success(), "advance notice of 5 days should clear the 72h default: {:?}", outcome.errors);
    let convocation_id = outcome.data.unwrap();

    let successor_id = convocation::decline(&store, &mut ctx, convocation_id, Some("personal emergency".into())).await.unwrap();

    let declined = store.get_convocation(convocation_id).await.unwrap();
    assert_eq!(declined.status, ConvocationStatus::Declined);
    assert_eq!(declined.decline_reason.as_deref(), Some("personal emergency"));

    let successor_id = successor_id.expect("same-window reschedule should clear validation for an otherwise-free employee");
    assert_eq!(declined.replacement_convocation_id, Some(successor_id));

    let successor = store.get_convocation(successor_id).await.unwrap();
    assert_eq!(successor.origin, ConvocationOrigin::Reschedule);
    assert_eq!(successor.replaced_convocation_id, Some(convocation_id));
    assert_eq!(successor.status, ConvocationStatus::Pending);
}

#[tokio::test]
async fn creation_is_blocked_when_rest_since_the_last_accepted_shift_is_too_short() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    store.set_sector_params(SectorOperationalParameters::default_for(sector_id, 100)).await;
    let employee_id = store.insert_employee(Employee::new(sector_id, "Ana Silva", "room_attendant", ContractVariant::Intermittent, 40.0)).await;

    store
        .insert_rule(Rule {
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
            code: housekeeping_planning_core::domain::rules::generate_rule_code("Minimum rest between shifts", RuleKind::Labor, RuleOwner::Global),
            deleted_at: None,
        })
        .await
        .unwrap();

    let now = Utc::now();
    let week_start = now.date_naive();
    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::Convocations, now);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));
    assert_eq!(ctx.rule_snapshot.min_rest_between_shifts_hours, 11.0);

    let first_date = (now + Duration::days(5)).date_naive();
    let first = CreateConvocationInput {
        employee_id,
        sector_id,
        date: first_date,
        start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        break_minutes: 30,
        origin: ConvocationOrigin::Baseline,
        response_hours: None,
    };
    let first_outcome = convocation::create(&store, &mut ctx, first).await.unwrap();
    let first_id = first_outcome.data.expect("first convocation should clear validation");
    convocation::accept(&store, &ctx, first_id).await.unwrap();

    let second = CreateConvocationInput {
        employee_id,
        sector_id,
        date: first_date + Duration::days(1),
        start_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        break_minutes: 30,
        origin: ConvocationOrigin::Baseline,
        response_hours: None,
    };
    let second_outcome = convocation::create(&store, &mut ctx, second).await.unwrap();
    assert!(!second_outcome.is_success(), "only 4 hours of rest since the prior accepted shift must block creation");
    assert!(second_outcome.errors.iter().any(|e| e.rule_code == "min_rest_between_shifts_hours"));
}
