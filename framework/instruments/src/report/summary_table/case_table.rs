use tabled::Tabled;

#[derive(Tabled)]
pub struct SingleCaseRow {
    pub case_id: String,
    #[tabled(display = "float2")]
    pub elapsed_s: f64,
    pub alert_s: u64,
    #[tabled(display = "flag")]
    pub over_budget: bool,
}

#[derive(Tabled)]
pub struct PhasedCaseRow {
    pub case_id: String,
    #[tabled(display = "float2")]
    pub elapsed_s: f64,
    pub overall_s: u64,
    /// Phase durations, with a `!` after each phase that went over its budget
    pub phases: String,
    #[tabled(display = "flag")]
    pub over_budget: bool,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn flag(over: &bool) -> String {
    if *over { "yes" } else { "" }.to_string()
}
