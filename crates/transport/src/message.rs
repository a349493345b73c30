//! Wire message types.
//!
//! The client sends [`Request`]s. The backend answers one-shot requests with
//! [`Message::Response`] and feeds command connections with
//! [`Message::Stream`] frames until it closes the connection.

use serde::{Deserialize, Serialize};

/// Sequence number type for request-response correlation.
pub type Seq = i64;

/// An incoming message from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// A response to a one-shot request.
    Response(Response),
    /// One frame of command output.
    Stream(StreamFrame),
}

/// A response to a one-shot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Sequence number of this response.
    pub seq: Seq,
    /// Sequence number of the request this response is for.
    pub request_seq: Seq,
    /// Whether the request was successful.
    pub success: bool,
    /// Error message if success is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response body (action-specific).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// One frame written by the backend while a command runs.
///
/// A single frame may move the listing, carry output and announce that the
/// debuggee has quit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListTarget>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub out: String,
    #[serde(default)]
    pub quit: bool,
}

/// Where the source listing should move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTarget {
    pub filename: String,
    pub line: usize,
    pub show_arrow: bool,
}

/// A request sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub seq: Seq,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "arguments", rename_all = "camelCase")]
pub enum RequestBody {
    /// Fetch a listing window and the breakpoints of its file.
    List(ListArguments),
    /// Create the breakpoint at a line, or flip its enabled flag.
    Toggle(BreakpointArguments),
    /// Delete the breakpoint at a line.
    Delete(BreakpointArguments),
    /// Replace a breakpoint's configuration directives.
    Update(UpdateArguments),
    /// Halt the debuggee. No response is expected.
    Interrupt,
    /// Run a debugger command. Only valid as the first request of a command
    /// connection.
    Command(CommandArguments),
}

impl RequestBody {
    /// Name of the action on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            RequestBody::List(_) => "list",
            RequestBody::Toggle(_) => "toggle",
            RequestBody::Delete(_) => "delete",
            RequestBody::Update(_) => "update",
            RequestBody::Interrupt => "interrupt",
            RequestBody::Command(_) => "command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArguments {
    pub filename: String,
    pub line: usize,
    pub show_arrow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointArguments {
    pub filename: String,
    pub line: usize,
    /// Text of the line as the client last saw it, so the backend can detect
    /// that the file changed underneath the listing.
    pub line_contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateArguments {
    pub name: String,
    pub config: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArguments {
    pub command: String,
}

/// Body of a `list` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingBody {
    #[serde(default)]
    pub lines: Vec<SourceLine>,
    #[serde(default)]
    pub breakpoints: Vec<BreakpointBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// 1-based line number.
    pub number: usize,
    pub text: String,
}

/// A breakpoint as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    pub filename: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub line_contents: String,
    #[serde(default)]
    pub config: String,
    #[serde(default)]
    pub enabled: bool,
}

impl BreakpointBody {
    /// The breakpoint's identity: its name, or `B<id>` for unnamed breakpoints.
    pub fn identity(&self) -> String {
        if self.name.is_empty() {
            format!("B{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// Body of an `update` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBody {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_response() {
        let json = r#"{
            "type": "response",
            "seq": 4,
            "request_seq": 1,
            "success": true,
            "body": {"ok": false}
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        let Message::Response(r) = msg else {
            panic!("expected a response");
        };
        assert_eq!(r.request_seq, 1);
        let body: UpdateBody = serde_json::from_value(r.body.unwrap()).unwrap();
        assert!(!body.ok);
    }

    #[test]
    fn deserialize_navigation_frame() {
        let json = r#"{
            "type": "stream",
            "list": {"filename": "main.go", "line": 10, "showArrow": true}
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        let Message::Stream(frame) = msg else {
            panic!("expected a stream frame");
        };
        assert_eq!(
            frame.list,
            Some(ListTarget {
                filename: "main.go".to_string(),
                line: 10,
                show_arrow: true,
            })
        );
        assert!(frame.out.is_empty());
        assert!(!frame.quit);
    }

    #[test]
    fn serialize_toggle_request() {
        let req = Request {
            seq: 3,
            body: RequestBody::Toggle(BreakpointArguments {
                filename: "main.go".to_string(),
                line: 10,
                line_contents: "\tx := f()".to_string(),
            }),
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""action":"toggle""#));
        assert!(json.contains(r#""lineContents":"\tx := f()""#));
    }

    #[test]
    fn unit_action_has_no_arguments() {
        let json = serde_json::to_string(&RequestBody::Interrupt).unwrap();
        assert_eq!(json, r#"{"action":"interrupt"}"#);

        let body: RequestBody = serde_json::from_str(&json).unwrap();
        assert_eq!(body, RequestBody::Interrupt);
    }

    #[test]
    fn unnamed_breakpoint_is_identified_by_id() {
        let bp: BreakpointBody =
            serde_json::from_str(r#"{"id": 7, "filename": "main.go", "line": 3}"#).unwrap();
        assert_eq!(bp.identity(), "B7");
        assert!(!bp.enabled);
    }
}
