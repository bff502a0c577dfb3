//! Light validation of templates that are already CloudFormation documents.
//!
//! A `*.stack.json` source is checked for the overall document shape, has
//! parameter overrides applied and is re-serialised in canonical formatting.
//! Resource types and properties are not validated.

use log::debug;

use cftemplate_core::{
    CompileResult,
    diagnostic::{ErrorCode, Issue, IssueCollector},
    value::{Json, ParameterOverrides},
};

const SECTIONS: &[&str] = &[
    "AWSTemplateFormatVersion",
    "Description",
    "Metadata",
    "Parameters",
    "Rules",
    "Mappings",
    "Conditions",
    "Transform",
    "Resources",
    "Outputs",
];

/// Check the document `text` and apply `overrides` to it.
///
/// Text that is not a JSON object yields an error and no output; every other
/// problem keeps the document.
pub fn check_document(
    text: &str,
    source_name: &str,
    overrides: &ParameterOverrides,
) -> CompileResult {
    let mut issues = IssueCollector::new();

    let mut document = match serde_json::from_str::<Json>(text) {
        Ok(Json::Object(document)) => document,
        Ok(other) => {
            let shape = match other {
                Json::Array(_) => "an array",
                Json::String(_) => "a string",
                Json::Number(_) => "a number",
                Json::Bool(_) => "a boolean",
                _ => "null",
            };
            issues.emit(
                Issue::error(format!("document must be a JSON object, found {shape}"))
                    .with_code(ErrorCode::E500)
                    .with_location(source_name),
            );
            return CompileResult::failed(issues.into_issues());
        }
        Err(error) => {
            issues.emit(
                Issue::error(format!("malformed document: {error}"))
                    .with_code(ErrorCode::E500)
                    .with_location(format!("{source_name}:{}:{}", error.line(), error.column())),
            );
            return CompileResult::failed(issues.into_issues());
        }
    };

    for section in document.keys() {
        if !SECTIONS.contains(&section.as_str()) {
            issues.emit(
                Issue::warn(format!("unknown top-level section `{section}`"))
                    .with_code(ErrorCode::E501)
                    .with_location(section.as_str()),
            );
        }
    }

    match document.get("Resources") {
        Some(Json::Object(resources)) if !resources.is_empty() => {
            for (name, resource) in resources {
                check_typed(&mut issues, "Resources", name, resource);
            }
        }
        _ => issues.emit(
            Issue::error("document defines no resources")
                .with_code(ErrorCode::E503)
                .with_location("Resources"),
        ),
    }

    if let Some(Json::Object(parameters)) = document.get("Parameters") {
        for (name, parameter) in parameters {
            check_typed(&mut issues, "Parameters", name, parameter);
        }
    }

    apply_overrides(&mut document, overrides, &mut issues);

    CompileResult::new(issues.into_issues(), Some(Json::Object(document)))
}

/// Entries of `section` must be objects carrying a string `Type`.
fn check_typed(issues: &mut IssueCollector, section: &str, name: &str, entry: &Json) {
    let message = match entry {
        Json::Object(fields) => match fields.get("Type") {
            Some(Json::String(_)) => return,
            Some(_) => "`Type` must be a string",
            None => "missing `Type`",
        },
        _ => "entry must be an object",
    };
    issues.emit(
        Issue::error(message)
            .with_code(ErrorCode::E502)
            .with_location(format!("{section}.{name}")),
    );
}

fn apply_overrides(
    document: &mut serde_json::Map<String, Json>,
    overrides: &ParameterOverrides,
    issues: &mut IssueCollector,
) {
    for (name, value) in overrides {
        let parameter = document
            .get_mut("Parameters")
            .and_then(|parameters| parameters.get_mut(name))
            .and_then(Json::as_object_mut);

        match parameter {
            Some(parameter) => {
                debug!(parameter = name.as_str(); "Applying parameter override");
                parameter.insert("Default".to_string(), Json::String(value.clone()));
            }
            None => issues.emit(
                Issue::debug(format!("parameter override `{name}` matches no parameter"))
                    .with_code(ErrorCode::E403),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cftemplate_core::diagnostic::Severity;
    use serde_json::json;

    fn check(text: &str) -> CompileResult {
        check_document(text, "db.stack.json", &ParameterOverrides::new())
    }

    fn codes(result: &CompileResult) -> Vec<ErrorCode> {
        result.issues().iter().filter_map(Issue::code).collect()
    }

    #[test]
    fn test_valid_document_passes_through() {
        let result = check(r#"{"Resources": {"Db": {"Type": "AWS::RDS::DBInstance"}}}"#);

        assert!(result.issues().is_empty());
        assert_eq!(
            result.output(),
            Some(&json!({"Resources": {"Db": {"Type": "AWS::RDS::DBInstance"}}}))
        );
    }

    #[test]
    fn test_malformed_document() {
        let result = check("{\"Resources\": ");

        assert!(result.output().is_none());
        assert_eq!(codes(&result), vec![ErrorCode::E500]);
        assert!(result.issues()[0].location().unwrap().starts_with("db.stack.json:1:"));
    }

    #[test]
    fn test_non_object_document() {
        let result = check("[1, 2]");

        assert!(result.output().is_none());
        assert_eq!(
            result.issues()[0].message(),
            "document must be a JSON object, found an array"
        );
    }

    #[test]
    fn test_unknown_section_warns() {
        let result = check(r#"{"Resources": {"Db": {"Type": "X"}}, "Extras": {}}"#);

        assert_eq!(codes(&result), vec![ErrorCode::E501]);
        assert_eq!(result.issues()[0].severity(), Severity::Warn);
        assert!(!result.has_failures());
    }

    #[test]
    fn test_missing_resources() {
        let result = check(r#"{"Resources": {}}"#);
        assert_eq!(codes(&result), vec![ErrorCode::E503]);
        assert!(result.output().is_some());
    }

    #[test]
    fn test_resources_array_is_not_resources() {
        let result = check(r#"{"Resources": [{"Type": "AWS::SQS::Queue"}]}"#);

        assert_eq!(codes(&result), vec![ErrorCode::E503]);
        assert_eq!(result.failure_count(), 1);
        assert!(result.output().is_some());
    }

    #[test]
    fn test_override_text_is_kept() {
        let mut overrides = ParameterOverrides::new();
        overrides.insert("Port".to_string(), "08".to_string());
        overrides.insert("Zones".to_string(), "a, b".to_string());

        let result = check_document(
            r#"{"Parameters": {"Port": {"Type": "Number"}, "Zones": {"Type": "CommaDelimitedList"}},
                "Resources": {"A": {"Type": "X"}}}"#,
            "db.stack.json",
            &overrides,
        );

        let parameters = &result.output().unwrap()["Parameters"];
        assert_eq!(parameters["Port"]["Default"], "08");
        assert_eq!(parameters["Zones"]["Default"], "a, b");
    }

    #[test]
    fn test_untyped_entries() {
        let result = check(
            r#"{"Parameters": {"Env": {"Default": "dev"}}, "Resources": {"A": {"Type": 3}, "B": []}}"#,
        );

        assert_eq!(codes(&result), vec![ErrorCode::E502; 3]);
        let locations: Vec<_> = result.issues().iter().filter_map(Issue::location).collect();
        assert_eq!(locations, vec!["Resources.A", "Resources.B", "Parameters.Env"]);
    }

    #[test]
    fn test_overrides_set_defaults() {
        let mut overrides = ParameterOverrides::new();
        overrides.insert("Env".to_string(), "prod".to_string());
        overrides.insert("Missing".to_string(), "x".to_string());

        let result = check_document(
            r#"{"Parameters": {"Env": {"Type": "String", "Default": "dev"}}, "Resources": {"A": {"Type": "X"}}}"#,
            "db.stack.json",
            &overrides,
        );

        assert_eq!(result.output().unwrap()["Parameters"]["Env"]["Default"], "prod");
        assert_eq!(codes(&result), vec![ErrorCode::E403]);
        assert_eq!(result.issues()[0].severity(), Severity::Debug);
    }
}
