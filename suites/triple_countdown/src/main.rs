use timed_trial_runner::prelude::*;

/// Practice runs for multi-phase tasks. The first case uses the standard three phase budgets, the
/// second splits a longer task into five phases.
fn phased_tasks() -> SuiteDefinition {
    SuiteDefinition::new("Phased Tasks")
        .with_case(CaseDefinition::triple("triple", ["assets/triple.png"]))
        .with_case(CaseDefinition::multi(
            "five-phase",
            ["assets/five_phase_1.png", "assets/five_phase_2.png"],
            90,
            80,
            vec![10, 15, 20, 15, 20],
        ))
}

fn main() -> TimedTrialResult<()> {
    let builder =
        SuiteDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME")).use_suite(phased_tasks());

    for summary in run(builder)? {
        let overruns = summary.results.over_budget().count();
        if overruns > 0 {
            log::warn!(
                "{overruns} cases in run {} went over their overall budget",
                summary.run_id
            );
        }
    }

    Ok(())
}
