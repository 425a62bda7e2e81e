//! Snippet tests for the G pipeline as a whole.
//!
//! Each file in `tests/snippets/` is a G program with a heading of
//! `// key: value` comment lines saying how to run it and what to
//! expect. Programs that run are executed on BOTH the VM and the
//! tree-walker, and the two must agree byte for byte.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use glang::common::source::Source;
use glang::compiler::{analyze, gen, lex, parse};
use glang::interp::Interp;
use glang::vm::Vm;

/// Specific success/failure modes of a snippet test.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Syntax,
    Semantic,
}

impl Outcome {
    pub fn parse(outcome: &str) -> Outcome {
        match outcome {
            "success"  => Outcome::Success,
            "syntax"   => Outcome::Syntax,
            "semantic" => Outcome::Semantic,
            invalid => panic!("invalid outcome '{}' in snippet heading", invalid),
        }
    }
}

/// What part of the pipeline a snippet drives.
#[derive(Debug)]
pub enum Action {
    Parse,
    Analyze,
    Compile,
    Run,
}

impl Action {
    pub fn parse(action: &str) -> Action {
        match action {
            "parse"   => Action::Parse,
            "analyze" => Action::Analyze,
            "compile" => Action::Compile,
            "run"     => Action::Run,
            invalid => panic!("invalid action '{}' in snippet heading", invalid),
        }
    }
}

/// The strategy from the top of a snippet file.
#[derive(Debug)]
pub struct TestStrat {
    action:  Action,
    outcome: Outcome,
    /// Expected stdout, for run snippets. `\n` and `\t` escapes are
    /// decoded so expectations fit on the heading line.
    expect:  Option<String>,
}

impl TestStrat {
    pub fn heading(heading: HashMap<String, String>) -> TestStrat {
        let mut action = None;
        let mut outcome = None;
        let mut expect = None;

        for (key, value) in heading {
            match key.as_str() {
                "action"  => action = Some(Action::parse(&value)),
                "outcome" => outcome = Some(Outcome::parse(&value)),
                "expect"  => expect = Some(decode(&value)),
                invalid => panic!("invalid key '{}' in snippet heading", invalid),
            }
        }

        TestStrat {
            action:  action.expect("no action provided"),
            outcome: outcome.expect("no outcome provided"),
            expect,
        }
    }

    /// Reads the `// key: value` heading off a snippet.
    pub fn snippet(source: &Rc<Source>) -> TestStrat {
        let mut heading = HashMap::new();

        for line in source.contents.lines() {
            let line = match line.strip_prefix("//") {
                Some(rest) => rest.trim(),
                None => break,
            };

            let split = match line.find(':') {
                Some(at) => at,
                None => break,
            };
            let key = line[..split].trim().to_string();
            let value = line[split + 1..].trim().to_string();

            if heading.insert(key, value).is_some() {
                panic!("key present twice in snippet heading");
            }
        }

        TestStrat::heading(heading)
    }
}

fn decode(expect: &str) -> String {
    expect.replace("\\n", "\n").replace("\\t", "\t")
}

/// A cloneable sink handed to the executors so the test can read
/// what they printed.
#[derive(Clone, Default)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is utf-8")
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn test_snippet(name: &str, source: Rc<Source>, strat: TestStrat) {
    let parsed = parse(lex(Rc::clone(&source)));

    let program = match (&strat.outcome, parsed) {
        (Outcome::Syntax, Err(_)) => return,
        (Outcome::Syntax, Ok(_)) => {
            panic!("{}: expected a syntax error, but it parsed", name);
        },
        (_, Err(errors)) => {
            for error in errors {
                println!("{}", error);
            }
            panic!("{}: did not parse", name);
        },
        (_, Ok(program)) => program,
    };

    if matches!(strat.action, Action::Parse) {
        return;
    }

    let checked = analyze(&program);
    match (&strat.outcome, checked) {
        (Outcome::Semantic, Err(_)) => return,
        (Outcome::Semantic, Ok(_)) => {
            panic!("{}: expected a semantic error, but it analyzed", name);
        },
        (_, Err(errors)) => {
            for error in errors {
                println!("{}", error);
            }
            panic!("{}: did not analyze", name);
        },
        (_, Ok(())) => {},
    }

    if matches!(strat.action, Action::Analyze) {
        return;
    }

    let module = gen(&program);
    if matches!(strat.action, Action::Compile) {
        return;
    }

    // run on the VM and the walker; they must agree
    let vm_sink = Sink::default();
    let mut vm = Vm::with_output(Box::new(vm_sink.clone()));
    vm.run(&module);

    let walk_sink = Sink::default();
    let mut interp = Interp::with_output(Box::new(walk_sink.clone()));
    interp.run(&program);

    let vm_out = vm_sink.contents();
    let walk_out = walk_sink.contents();

    assert_eq!(
        vm_out, walk_out,
        "{}: VM and tree-walker disagree",
        name,
    );

    if let Some(expect) = &strat.expect {
        assert_eq!(&vm_out, expect, "{}: unexpected output", name);
    }
}

#[test]
fn snippets() {
    let paths = fs::read_dir("./tests/snippets")
        .expect("snippets live in ./tests/snippets");

    let mut to_run: Vec<PathBuf> = vec![];
    for path in paths {
        to_run.push(path.expect("could not read path").path());
    }
    to_run.sort();

    println!("\nrunning {} snippet test(s)...", to_run.len());

    for path in to_run {
        let name = path.display().to_string();
        println!("snippet {}...", name);

        let source = Source::path(&path).expect("could not read snippet");
        let strat = TestStrat::snippet(&source);

        test_snippet(&name, source, strat);
    }
}
