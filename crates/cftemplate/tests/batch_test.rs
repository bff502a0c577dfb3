use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use serde_json::json;
use tempfile::{TempDir, tempdir};

use cftemplate::{
    BatchCompiler, CftemplateError, CompileResult, compile_all,
    compiler::TemplateCompiler,
    config::{AppConfig, WritePolicy},
    diagnostic::Issue,
    value::ParameterOverrides,
};

const BUCKET_STACK: &str = r#"
parameter "BucketName", :string do
  default "assets"
end

resource "Bucket", "AWS::S3::Bucket" do
  properties "BucketName" => ref("BucketName")
end
"#;

const BROKEN_STACK: &str = r#"
resource "Bucket", "AWS::S3::Bucket"
output "Name", frob("Bucket")
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("Failed to create temp directory"),
        }
    }

    fn input(&self) -> PathBuf {
        self.dir.path().join("templates")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.input().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.compile.input_dir = self.input();
        config.compile.output_dir = self.output();
        config
    }

    fn read_output(&self, relative: &str) -> serde_json::Value {
        let text = fs::read_to_string(self.output().join(relative)).expect("Missing output");
        serde_json::from_str(&text).expect("Output is not JSON")
    }
}

#[test]
fn test_compiles_mirrored_tree() {
    let workspace = Workspace::new();
    workspace.write("app/web.stack.rb", BUCKET_STACK);
    workspace.write(
        "db.stack.json",
        r#"{"Resources": {"Db": {"Type": "AWS::RDS::DBInstance"}}}"#,
    );

    let summary = compile_all(workspace.config()).expect("Batch should succeed");

    assert_eq!(summary.compiled, 2);
    assert_eq!(summary.failures, 0);
    assert_eq!(
        workspace.read_output("app/web.stack.json"),
        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Parameters": {
                "BucketName": { "Type": "String", "Default": "assets" }
            },
            "Resources": {
                "Bucket": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": { "BucketName": { "Ref": "BucketName" } }
                }
            }
        })
    );
    assert_eq!(
        workspace.read_output("db.stack.json")["Resources"]["Db"]["Type"],
        "AWS::RDS::DBInstance"
    );
}

#[test]
fn test_warnings_do_not_fail_batch() {
    let workspace = Workspace::new();
    workspace.write(
        "db.stack.json",
        r#"{"Resources": {"Db": {"Type": "X"}}, "Extras": {}}"#,
    );

    let summary = compile_all(workspace.config()).expect("Warnings should not fail");
    assert_eq!(summary.compiled, 1);
    assert!(summary.succeeded());
}

#[test]
fn test_error_fails_batch_but_writes_output() {
    let workspace = Workspace::new();
    workspace.write("broken.stack.rb", BROKEN_STACK);
    workspace.write("web.stack.rb", BUCKET_STACK);

    let error = compile_all(workspace.config()).unwrap_err();

    assert!(matches!(error, CftemplateError::BatchFailed { count: 1 }));
    assert_eq!(error.to_string(), "1 errors compiling CloudFormation templates");
    let broken = workspace.read_output("broken.stack.json");
    assert!(broken["Resources"].get("Bucket").is_some());
    assert!(broken.get("Outputs").is_none());
    assert!(workspace.output().join("web.stack.json").exists());
}

#[test]
fn test_skip_on_error_suppresses_output() {
    let workspace = Workspace::new();
    workspace.write("broken.stack.rb", BROKEN_STACK);
    workspace.write("web.stack.rb", BUCKET_STACK);
    let mut config = workspace.config();
    config.compile.write_policy = WritePolicy::SkipOnError;

    assert!(compile_all(config).is_err());
    assert!(!workspace.output().join("broken.stack.json").exists());
    assert!(workspace.output().join("web.stack.json").exists());
}

#[test]
fn test_syntax_error_writes_nothing() {
    let workspace = Workspace::new();
    workspace.write("open.stack.rb", "resource \"A\" do\n");

    let error = compile_all(workspace.config()).unwrap_err();
    assert!(matches!(error, CftemplateError::BatchFailed { count: 1 }));
    assert!(!workspace.output().join("open.stack.json").exists());
}

#[test]
fn test_invalid_utf8_fails_only_that_template() {
    let workspace = Workspace::new();
    workspace.write("a.stack.rb", BUCKET_STACK);
    workspace.write("x.stack.rb", b"description \"\xff\"\n");
    workspace.write("z.stack.rb", BUCKET_STACK);

    let error = compile_all(workspace.config()).unwrap_err();

    assert!(matches!(error, CftemplateError::BatchFailed { count: 1 }));
    assert!(workspace.output().join("a.stack.json").exists());
    assert!(!workspace.output().join("x.stack.json").exists());
    assert!(workspace.output().join("z.stack.json").exists());
}

#[test]
fn test_resources_array_fails_document() {
    let workspace = Workspace::new();
    workspace.write("db.stack.json", r#"{"Resources": [{"Type": "AWS::SQS::Queue"}]}"#);

    let error = compile_all(workspace.config()).unwrap_err();
    assert!(matches!(error, CftemplateError::BatchFailed { count: 1 }));
}

#[test]
fn test_output_dir_prepared_before_walk() {
    let workspace = Workspace::new();
    workspace.write("web.stack.rb", BUCKET_STACK);
    let mut config = workspace.config();
    config.compile.includes = vec!["[".to_string()];

    let error = compile_all(config).unwrap_err();

    assert!(matches!(error, CftemplateError::Pattern { .. }));
    assert!(workspace.output().is_dir());
}

#[test]
fn test_includes_select_documents_only() {
    let workspace = Workspace::new();
    workspace.write("a/foo.stack.json", r#"{"Resources": {"A": {"Type": "X"}}}"#);
    workspace.write("a/bar.txt", "notes");
    workspace.write("b/baz.stack.rb", BUCKET_STACK);
    let mut config = workspace.config();
    config.compile.includes = vec!["*stack.json".to_string()];

    let summary = compile_all(config).unwrap();

    assert_eq!(summary.compiled, 1);
    assert!(workspace.output().join("a/foo.stack.json").exists());
    assert!(!workspace.output().join("b").exists());
}

#[test]
fn test_unsupported_extension_is_skipped() {
    let workspace = Workspace::new();
    workspace.write("notes.txt", "notes");
    let mut config = workspace.config();
    config.compile.includes = vec!["*".to_string()];

    let summary = compile_all(config).unwrap();
    assert_eq!(summary.compiled, 0);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_missing_input_dir_succeeds() {
    let workspace = Workspace::new();

    let summary = compile_all(workspace.config()).unwrap();
    assert_eq!(summary.compiled, 0);
    assert!(!workspace.output().exists());
}

#[test]
fn test_empty_work_list_registers_output_once() {
    let workspace = Workspace::new();
    fs::create_dir_all(workspace.input()).unwrap();

    let mut batch = BatchCompiler::new(workspace.config());
    assert!(batch.run().unwrap().succeeded());
    assert!(batch.run().unwrap().succeeded());

    assert!(workspace.output().is_dir());
    assert_eq!(batch.roots().roots(), &[workspace.output()]);
}

#[test]
fn test_overrides_reach_every_front_end() {
    let workspace = Workspace::new();
    workspace.write("web.stack.rb", BUCKET_STACK);
    workspace.write(
        "db.stack.json",
        r#"{"Parameters": {"BucketName": {"Type": "String"}}, "Resources": {"A": {"Type": "X"}}}"#,
    );
    let mut config = workspace.config();
    config
        .parameters
        .insert("BucketName".to_string(), "media".to_string());

    compile_all(config).unwrap();

    for output in ["web.stack.json", "db.stack.json"] {
        assert_eq!(
            workspace.read_output(output)["Parameters"]["BucketName"]["Default"],
            "media"
        );
    }
}

/// Records every source it is asked to compile and fails on `fail_on`.
struct RecordingCompiler {
    calls: Rc<RefCell<Vec<PathBuf>>>,
    fail_on: Option<&'static str>,
}

impl TemplateCompiler for RecordingCompiler {
    fn compile(
        &self,
        source: &Path,
        _target: &Path,
        _overrides: &ParameterOverrides,
    ) -> Result<CompileResult, CftemplateError> {
        self.calls.borrow_mut().push(source.to_path_buf());
        let file_name = source.file_name().unwrap().to_string_lossy();
        if self.fail_on == Some(file_name.as_ref()) {
            return Err(CftemplateError::io(
                source,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        Ok(CompileResult::new(Vec::new(), None))
    }
}

/// Reports the same issues for every source.
struct FixedCompiler {
    issues: Vec<Issue>,
}

impl TemplateCompiler for FixedCompiler {
    fn compile(
        &self,
        _source: &Path,
        _target: &Path,
        _overrides: &ParameterOverrides,
    ) -> Result<CompileResult, CftemplateError> {
        Ok(CompileResult::new(self.issues.clone(), None))
    }
}

#[test]
fn test_only_errors_count_as_failures() {
    let workspace = Workspace::new();
    workspace.write("a.stack.rb", "");
    let dsl = FixedCompiler {
        issues: vec![
            Issue::debug("trace"),
            Issue::info("note"),
            Issue::error("broken"),
            Issue::warn("advice"),
        ],
    };
    let document = FixedCompiler { issues: Vec::new() };
    let mut batch =
        BatchCompiler::with_compilers(workspace.config(), Box::new(dsl), Box::new(document));

    let summary = batch.run().unwrap();

    assert_eq!(summary.compiled, 1);
    assert_eq!(summary.failures, 1);
    assert!(matches!(
        summary.into_result(),
        Err(CftemplateError::BatchFailed { count: 1 })
    ));
}

#[test]
fn test_io_failure_aborts_batch() {
    let workspace = Workspace::new();
    workspace.write("a.stack.rb", "");
    workspace.write("b.stack.rb", "");
    workspace.write("c.stack.rb", "");

    let calls = Rc::new(RefCell::new(Vec::new()));
    let dsl = RecordingCompiler {
        calls: Rc::clone(&calls),
        fail_on: Some("b.stack.rb"),
    };
    let document = RecordingCompiler {
        calls: Rc::clone(&calls),
        fail_on: None,
    };
    let mut batch =
        BatchCompiler::with_compilers(workspace.config(), Box::new(dsl), Box::new(document));

    let error = batch.run().unwrap_err();

    assert!(matches!(error, CftemplateError::Io { ref path, .. } if path.ends_with("b.stack.rb")));
    let compiled: Vec<_> = calls
        .borrow()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(compiled, vec!["a.stack.rb", "b.stack.rb"]);
}
