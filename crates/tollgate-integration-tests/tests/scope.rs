//! Integration tests for run-level versus task-level chain selection.

use tollgate_approval::{APPROVAL_NOT_REQUIRED, ApprovalEngine};
use tollgate_approval::scope::ChainScope;
use tollgate_core::{Approval, ApprovalDecision};
use tollgate_test::{ScriptedApprover, bash_call, test_call, test_chain, test_state};

/// With both chains present only the run-level chain is consulted, whatever
/// the task-level chain contains.
#[tokio::test]
async fn test_run_chain_is_exclusive() {
    for task_decision in [
        Approval::approve("task says yes"),
        Approval::reject("task says no"),
        Approval::terminate("task says stop"),
    ] {
        let run = ScriptedApprover::new("run").with_default(Approval::reject("run says no"));
        let task = ScriptedApprover::new("task").with_default(task_decision);
        let engine = ApprovalEngine::new(
            Some(test_chain(vec![(run.shared(), vec!["bash"])])),
            Some(test_chain(vec![(task.shared(), vec!["*"])])),
        );
        assert_eq!(engine.scope(), Some(ChainScope::Run));
        let sample = engine.sample(test_state("1"));

        let bash = sample.approve("", &bash_call("ls")).await.unwrap();
        assert_eq!(bash.explanation(), "run says no");

        // Chains are never merged: the task chain's `*` does not cover python.
        let python = sample.approve("", &test_call("python")).await.unwrap();
        assert_eq!(python.decision, ApprovalDecision::Reject);
        assert_eq!(task.call_count(), 0);
    }
}

/// Without a run-level chain the task-level chain decides.
#[tokio::test]
async fn test_task_chain_used_alone() {
    let task = ScriptedApprover::new("task").with_default(Approval::approve("task says yes"));
    let engine = ApprovalEngine::new(None, Some(test_chain(vec![(task.shared(), vec!["*"])])));
    assert_eq!(engine.scope(), Some(ChainScope::Task));

    let approval = engine
        .sample(test_state("1"))
        .approve("", &bash_call("ls"))
        .await
        .unwrap();
    assert_eq!(approval.explanation(), "task says yes");
}

/// Neither chain: approval is off and nothing is consulted.
#[tokio::test]
async fn test_no_chain_disables_approval() {
    let engine = ApprovalEngine::new(None, None);
    assert!(!engine.is_enabled());
    let mut events = engine.subscribe();

    let approval = engine
        .sample(test_state("1"))
        .approve("", &bash_call("rm -rf /"))
        .await
        .unwrap();

    assert_eq!(approval.decision, ApprovalDecision::Approve);
    assert_eq!(approval.explanation(), APPROVAL_NOT_REQUIRED);
    assert!(events.try_recv().is_err());
}
