//! Search strategy preview.

use crate::config::Config;
use crate::format::Formatter;
use crate::regrid::strategy;
use crate::regrid::SearchInput;

/// Prints the ordered search strategies for a request.
pub struct PlanCommand {
    config: Config,
}

impl PlanCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(&self, input: &SearchInput) -> String {
        let strategies = strategy::plan(input);
        Formatter::new(self.config.format).format_strategies(&strategies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::regrid::Jurisdiction;

    #[test]
    fn test_plan_output() {
        let config = Config { format: OutputFormat::Csv, ..Config::default() };
        let input = SearchInput::new("03-09-015-000-00-000", Jurisdiction::new("PA", "Blair"))
            .with_address("815 3rd Ave");

        let output = PlanCommand::new(config).execute(&input);
        assert_eq!(
            output,
            "order,method,query\n1,address,815 3rd Ave\n2,parcel,0309015000000\n3,parcel_stripped,309015000000"
        );
    }
}
