use timed_trial_runner::prelude::*;

fn sample_quiz() -> SuiteDefinition {
    SuiteDefinition::new("Sample Quiz")
        .with_case(CaseDefinition::single(
            "1",
            ["assets/image1.png", "assets/image2.png"],
            30,
            5,
        ))
        .with_case(CaseDefinition::single("2", ["assets/image3.png"], 45, 5))
        .with_case(CaseDefinition::single("3", ["assets/image4.png"], 60, 5))
        .with_case(CaseDefinition::single("4", ["assets/image5.png"], 75, 5))
        .with_case(CaseDefinition::single("5", ["assets/image6.png"], 90, 5))
}

fn triple_countdown_test() -> SuiteDefinition {
    SuiteDefinition::new("Triple Countdown Test").with_case(CaseDefinition::multi(
        "6",
        ["assets/image7.png"],
        120,
        100,
        vec![3, 3, 4],
    ))
}

fn main() -> TimedTrialResult<()> {
    let builder = SuiteDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
        .use_suite(sample_quiz())
        .use_suite(triple_countdown_test());

    run(builder)?;

    Ok(())
}
