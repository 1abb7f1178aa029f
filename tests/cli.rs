// End-to-end tests for the compiler binary

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn tbc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tbc"))
        .args(args)
        .output()
        .expect("failed to run tbc")
}

fn write_source(dir: &TempDir, name: &str, program: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, program).expect("write source file");
    path.to_str().unwrap().to_owned()
}

const FIBONACCI: &str = r#"PRINT "How many fibonacci numbers do you want?"
INPUT nums
PRINT ""

LET a = 0
LET b = 1
WHILE nums > 0 REPEAT
    PRINT a
    LET c = a + b
    LET a = b
    LET b = c
    LET nums = nums - 1
ENDWHILE
"#;

#[test]
fn writes_out_c_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "fib.bas", FIBONACCI);

    let output = tbc(&[&source]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let c = fs::read_to_string(dir.path().join("out.c")).expect("out.c was not written");
    assert!(c.starts_with("#include <stdio.h>\nint main(void){\nfloat nums;\nfloat a;\nfloat b;\nfloat c;\n"));
    assert!(c.contains("printf(\"How many fibonacci numbers do you want?\\n\");\n"));
    assert!(c.contains("if (0 == scanf(\"%f\", &nums)) {\n"));
    assert!(c.contains("while(nums > 0){\n"));
    assert!(c.contains("c = a + b;\n"));
    assert!(c.ends_with("return 0;\n}\n"));
}

#[test]
fn explicit_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "hello.bas", "PRINT \"hello, world\"");
    let target = dir.path().join("hello.c");

    let output = tbc(&[&source, "-o", target.to_str().unwrap()]);
    assert!(output.status.success());

    let c = fs::read_to_string(&target).unwrap();
    assert!(c.contains("printf(\"hello, world\\n\");"));
    assert!(!dir.path().join("out.c").exists());
}

#[test]
fn output_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "empty.bas", "\n\n");

    let output = tbc(&[&source, "-o", "-"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "#include <stdio.h>\nint main(void){\nreturn 0;\n}\n"
    );
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "fib.bas", FIBONACCI);
    let out = dir.path().join("out.c");

    assert!(tbc(&[&source]).status.success());
    let first = fs::read(&out).unwrap();

    assert!(tbc(&[&source]).status.success());
    assert_eq!(first, fs::read(&out).unwrap());
}

fn assert_fails_without_output(program: &str, message: &str) {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "bad.bas", program);

    let output = tbc(&[&source]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains(message), "unexpected stderr: {}", stderr);
    assert!(!dir.path().join("out.c").exists());
}

#[test]
fn undefined_variable_fails() {
    assert_fails_without_output("PRINT y\n", "Referencing variable before assignment: y");
}

#[test]
fn dangling_goto_fails() {
    assert_fails_without_output(
        "LABEL top\nGOTO nowhere\n",
        "Attempting to GOTO to undeclared label: nowhere",
    );
}

#[test]
fn duplicate_label_fails() {
    assert_fails_without_output("LABEL a\nLABEL a\n", "Label already exists: a");
}

#[test]
fn percent_in_string_fails() {
    assert_fails_without_output(
        "PRINT \"100% sure\"\n",
        "Lexing error. Illegal character in string.",
    );
}

#[test]
fn invalid_statement_fails() {
    assert_fails_without_output("LET a = 1\nENDIF\n", "Invalid statement at ENDIF");
}

#[test]
fn missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.bas");

    let output = tbc(&[missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read source file"));
}

#[test]
fn refuses_to_overwrite_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "out.c", "PRINT 1\n");

    let output = tbc(&[&source]);
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(&source).unwrap(), "PRINT 1\n");
}

#[test]
fn token_dump() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "let.bas", "LET x = 1.5 # comment");

    let output = tbc(&[&source, "--tokens"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "LET: LET\nx: IDENT\n=: EQ\n1.5: NUMBER\n\\n: NEWLINE\n: EOF\n"
    );
    assert!(!dir.path().join("out.c").exists());
}

#[test]
fn token_dump_stops_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "bang.bas", "IF a ! b THEN\n");

    let output = tbc(&[&source, "--tokens"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Lexing error. Expected !=, got ! "));
}

// Builds the emitted C with `cc` and runs it on `stdin`. Returns `None`
// when no C compiler is installed.
fn compile_and_run(program: &str, stdin: &str) -> Option<String> {
    let available = Command::new("cc")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_or(false, |status| status.success());

    if !available {
        eprintln!("cc not found, skipping");
        return None;
    }

    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.bas", program);

    let output = tbc(&[&source]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let binary = dir.path().join("prog");
    let cc = Command::new("cc")
        .args(["-std=c99", "-o"])
        .arg(&binary)
        .arg(dir.path().join("out.c"))
        .output()
        .expect("failed to run cc");
    assert!(cc.status.success(), "cc: {}", String::from_utf8_lossy(&cc.stderr));

    Some(run(&binary, stdin))
}

fn run(binary: &Path, stdin: &str) -> String {
    let mut child = Command::new(binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to run compiled program");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn fibonacci_runs() {
    let Some(stdout) = compile_and_run(FIBONACCI, "5\n") else { return };
    assert_eq!(
        stdout,
        "How many fibonacci numbers do you want?\n\n0.00\n1.00\n1.00\n2.00\n3.00\n"
    );
}

#[test]
fn non_numeric_input_reads_as_zero() {
    let Some(stdout) = compile_and_run(FIBONACCI, "many\n") else { return };
    assert_eq!(stdout, "How many fibonacci numbers do you want?\n\n");

    let program = "INPUT a\nINPUT b\nPRINT a\nPRINT a + b\n";
    let Some(stdout) = compile_and_run(program, "x 4\n") else { return };
    assert_eq!(stdout, "0.00\n4.00\n");
}

#[test]
fn labels_and_gotos_run() {
    let program = r#"LET i = 0
GOTO start
LABEL skipped
PRINT "never"
LABEL start
LET i = i + 1
PRINT i
IF i < 3 THEN
    GOTO start
ENDIF
LABEL main
PRINT "done"
"#;

    let Some(stdout) = compile_and_run(program, "") else { return };
    assert_eq!(stdout, "1.00\n2.00\n3.00\ndone\n");
}
