pub mod context_wording;
pub mod method_label;
pub mod model_mocking;
pub mod should_wording;
pub mod single_expectation;
pub mod single_test_context;

use crate::analysis::rule::StyleRule;

/// Every built-in rule, in the order they are registered and listed
pub fn builtin_rules() -> Vec<Box<dyn StyleRule>> {
    vec![
        Box::new(single_expectation::SingleExpectationRule),
        Box::new(should_wording::NoShouldWordingRule),
        Box::new(iterator_tests::NoIteratorGeneratedTestsRule),
        Box::new(method_label::MethodLabelFormatRule),
        Box::new(context_wording::ContextStartsWithWhenRule),
        Box::new(single_test_context::NoSingleTestContextRule),
        Box::new(model_mocking::AvoidModelMockingRule),
    ]
}
