//! Scripted command runner for tests.
//!
//! Rules map a (program, args) shape onto canned output; every invocation is
//! recorded so tests can assert that no mutating spooler command ran. A rule
//! may carry a sequence of outputs, which lets a test model state that flips
//! under the commands ("queue absent, then present once created").

use std::cell::RefCell;

use pharos_common::error::CommandError;

use crate::command::{CmdOutput, CommandRunner};

/// One invocation as seen by the fake runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

type Matcher = Box<dyn Fn(&str, &[&str]) -> bool>;

struct Rule {
    matcher: Matcher,
    response: Response,
}

enum Response {
    /// Outputs consumed front to back; the last one repeats forever.
    Sequence(RefCell<Vec<CmdOutput>>),
    SpawnError,
}

/// A [`CommandRunner`] that replays scripted responses.
///
/// Rules are evaluated most-recently-added first, so a test can lay down a
/// broad default and then override single commands. Unmatched commands
/// succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: RefCell<Vec<Rule>>,
    invocations: RefCell<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(stdout: &str) -> CmdOutput {
        CmdOutput {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failing(stderr: &str) -> CmdOutput {
        CmdOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Responds with `output` whenever `program` is invoked, regardless of
    /// its arguments.
    pub fn on_program(&self, program: &str, output: CmdOutput) {
        let expected = program.to_string();
        self.push(
            Box::new(move |p, _| p == expected),
            Response::Sequence(RefCell::new(vec![output])),
        );
    }

    /// Responds with `output` when the full command line (program followed
    /// by its arguments, space-joined) equals `line`.
    pub fn on_line(&self, line: &str, output: CmdOutput) {
        self.on_line_seq(line, vec![output]);
    }

    /// Like [`on_line`](Self::on_line), but walks through `outputs` call by
    /// call, repeating the final one.
    pub fn on_line_seq(&self, line: &str, outputs: Vec<CmdOutput>) {
        assert!(!outputs.is_empty(), "sequence needs at least one output");
        let expected = line.to_string();
        self.push(
            Box::new(move |p, a| full_line(p, a) == expected),
            Response::Sequence(RefCell::new(outputs)),
        );
    }

    /// Makes every invocation of `program` fail to spawn.
    pub fn refuse_program(&self, program: &str) {
        let expected = program.to_string();
        self.push(Box::new(move |p, _| p == expected), Response::SpawnError);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Command lines of every invocation of `program`, in order.
    pub fn lines_for(&self, program: &str) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter(|inv| inv.program == program)
            .map(Invocation::line)
            .collect()
    }

    fn push(&self, matcher: Matcher, response: Response) {
        self.rules.borrow_mut().push(Rule { matcher, response });
    }
}

fn full_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput, CommandError> {
        self.invocations.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });

        let rules = self.rules.borrow();
        for rule in rules.iter().rev() {
            if (rule.matcher)(program, args) {
                return match &rule.response {
                    Response::Sequence(outputs) => {
                        let mut outputs = outputs.borrow_mut();
                        if outputs.len() > 1 {
                            Ok(outputs.remove(0))
                        } else {
                            Ok(outputs[0].clone())
                        }
                    }
                    Response::SpawnError => Err(CommandError::Spawn {
                        program: program.to_string(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    }),
                };
            }
        }

        Ok(Self::ok(""))
    }
}
