//! JUnit-style console report.
//!
//! The test driver prints a `<testsuite>` document to stdout so CI systems
//! can pick the results up. Failure bodies carry the captured emulator
//! output; escaping is handled by the XML writer.

use std::io::Write;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Result of one built-and-emulated tutorial stage.
#[derive(Debug)]
pub struct TestCase {
    pub classname: String,
    pub name: String,
    pub failure: Option<Failure>,
}

/// Why a test case did not produce its completion text.
#[derive(Debug)]
pub struct Failure {
    /// `failure` for a missed completion, `error` for harness trouble.
    pub kind: String,
    pub message: String,
    /// Captured emulator output, to help debug the failure.
    pub output: String,
}

/// Write the report for a finished test run.
pub fn write_report<W: Write>(cases: &[TestCase], out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    let failures = cases.iter().filter(|c| c.failure.is_some()).count();
    let mut suite = BytesStart::new("testsuite");
    suite.push_attribute(("tests", cases.len().to_string().as_str()));
    suite.push_attribute(("failures", failures.to_string().as_str()));
    writer.write_event(Event::Start(suite))?;

    for case in cases {
        let mut start = BytesStart::new("testcase");
        start.push_attribute(("classname", case.classname.as_str()));
        start.push_attribute(("name", case.name.as_str()));
        writer.write_event(Event::Start(start))?;

        if let Some(failure) = &case.failure {
            let mut element = BytesStart::new("failure");
            element.push_attribute(("type", failure.kind.as_str()));
            element.push_attribute(("message", failure.message.as_str()));
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Text(BytesText::new(&failure.output)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

/// Write the report to stdout.
pub fn print_report(cases: &[TestCase]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_report(cases, &mut stdout)?;
    writeln!(stdout)?;
    Ok(())
}
