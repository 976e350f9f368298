//! Planner Integration Tests
//!
//! Static task table properties and rule-based plans.

use lexbrief::services::planner::task_table::topological_order;
use lexbrief::services::planner::{rule_based_plan, spec, validate_sequence, TASK_SPECS};
use lexbrief::services::preferences::PreferenceSet;
use lexbrief_core::{ResultBag, TaskId, TaskResult};
use serde_json::json;

#[test]
fn test_task_table_is_acyclic() {
    let order = topological_order().expect("task table has a cycle");
    assert_eq!(order.len(), TASK_SPECS.len());
    validate_sequence(&order, &ResultBag::new()).unwrap();
}

#[test]
fn test_task_table_covers_every_task_once() {
    for id in TaskId::ALL {
        assert_eq!(spec(id).id, id);
        assert_eq!(TASK_SPECS.iter().filter(|s| s.id == id).count(), 1);
    }
}

#[test]
fn test_dependencies_reference_known_tasks() {
    for task_spec in TASK_SPECS.iter() {
        for dep in task_spec.depends_on {
            assert_ne!(*dep, task_spec.id, "{} depends on itself", task_spec.id);
            assert!(TaskId::ALL.contains(dep));
        }
    }
}

#[test]
fn test_rule_based_plans_are_topological() {
    let requests = ["Summarize the opinion", "Extract the holding", "brief please"];
    let mut prefs = PreferenceSet::default();
    for auto_brief in [false, true] {
        for normalize in [false, true] {
            prefs.general.auto_generate_brief = auto_brief;
            prefs.citation.normalize_citations = normalize;
            for request in requests {
                let plan = rule_based_plan(request, &prefs, &ResultBag::new());
                validate_sequence(&plan.task_ids(), &ResultBag::new()).unwrap();
                assert_eq!(plan.task_ids()[0], TaskId::Extract);
                assert_eq!(plan.contains(TaskId::NormalizeCitations), normalize);
            }
        }
    }
}

#[test]
fn test_prior_extraction_is_not_replanned() {
    let mut prior = ResultBag::new();
    prior.insert(TaskResult::success(
        TaskId::Extract,
        json!({"citations": ["347 U.S. 483"]}),
        0.8,
    ));
    let plan = rule_based_plan("Summarize it", &PreferenceSet::default(), &prior);
    assert_eq!(plan.task_ids(), vec![TaskId::Brief, TaskId::NormalizeCitations]);
    validate_sequence(&plan.task_ids(), &prior).unwrap();
}
