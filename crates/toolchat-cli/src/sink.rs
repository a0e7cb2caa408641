//! CLI-specific response sink for terminal output.
//!
//! Assistant text streams to stdout as it arrives. Tool activity is shown as
//! `[Tool: name]` lines; diagnostics, tool results and reasoning go to stderr
//! (the latter two only with `--verbose`).

use std::io::{self, Stdout, Write};
use toolchat_core::api::sink::{ResponseEvent, ResponseSink};

pub struct TerminalSink<W: Write> {
    out: W,
    verbose: bool,
    /// Text of the model call currently (or most recently) streaming.
    current: String,
    at_line_start: bool,
}

impl TerminalSink<Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            current: String::new(),
            at_line_start: true,
        }
    }

    /// Print the turn's answer unless it already streamed out verbatim.
    pub fn print_answer(&mut self, answer: &str) -> io::Result<()> {
        if self.current.trim() != answer.trim() {
            self.end_line()?;
            writeln!(self.out, "{}", answer)?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_line(&mut self) -> io::Result<()> {
        if !self.at_line_start {
            writeln!(self.out)?;
            self.at_line_start = true;
        }
        Ok(())
    }

    fn diagnostic(&self, message: &str, verbose_only: bool) {
        if !verbose_only || self.verbose {
            eprintln!("{}", message);
        }
    }
}

impl<W: Write> ResponseSink for TerminalSink<W> {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        match event {
            ResponseEvent::TextChunk(chunk) => {
                self.current.push_str(chunk);
                write!(self.out, "{}", chunk)?;
                self.out.flush()?;
                self.at_line_start = chunk.ends_with('\n');
            }
            ResponseEvent::Reasoning(chunk) => {
                if self.verbose {
                    eprint!("{}", chunk);
                }
            }
            ResponseEvent::Diagnostic {
                message,
                verbose_only,
            } => self.diagnostic(&message, verbose_only),
            ResponseEvent::ToolStart { name } => {
                self.end_line()?;
                writeln!(self.out, "[Tool: {}]", name)?;
            }
            ResponseEvent::ToolResult { name, result } => {
                self.diagnostic(&format!("[Tool {} -> {}]", name, result), true);
            }
            ResponseEvent::StartResponse => {
                self.end_line()?;
                self.current.clear();
            }
            ResponseEvent::Finished => {
                self.end_line()?;
                self.out.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(sink: TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_streamed_answer_is_not_repeated() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.handle(ResponseEvent::StartResponse).unwrap();
        sink.handle(ResponseEvent::TextChunk("现在是")).unwrap();
        sink.handle(ResponseEvent::TextChunk("中午。")).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();
        sink.print_answer("现在是中午。").unwrap();
        assert_eq!(output(sink), "现在是中午。\n");
    }

    #[test]
    fn test_tool_lines_and_final_response() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.handle(ResponseEvent::StartResponse).unwrap();
        sink.handle(ResponseEvent::ToolStart {
            name: "get_current_weather".into(),
        })
        .unwrap();
        sink.handle(ResponseEvent::ToolResult {
            name: "get_current_weather".into(),
            result: "晴".into(),
        })
        .unwrap();
        sink.handle(ResponseEvent::StartResponse).unwrap();
        sink.handle(ResponseEvent::TextChunk("北京晴。")).unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();
        sink.print_answer("北京晴。").unwrap();
        assert_eq!(output(sink), "[Tool: get_current_weather]\n北京晴。\n");
    }

    #[test]
    fn test_unstreamed_answer_is_printed() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.handle(ResponseEvent::StartResponse).unwrap();
        sink.handle(ResponseEvent::Diagnostic {
            message: "chat call failed".into(),
            verbose_only: false,
        })
        .unwrap();
        sink.handle(ResponseEvent::Finished).unwrap();
        sink.print_answer("Sorry.").unwrap();
        assert_eq!(output(sink), "Sorry.\n");
    }

    #[test]
    fn test_partial_stream_then_apology_starts_new_line() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.handle(ResponseEvent::StartResponse).unwrap();
        sink.handle(ResponseEvent::TextChunk("partial")).unwrap();
        sink.print_answer("Sorry.").unwrap();
        assert_eq!(output(sink), "partial\nSorry.\n");
    }
}
