use std::sync::Arc;

use gpui::*;
use gpui_component::v_flex;
use gpui_tokio_bridge::Tokio;

use parley_client::ChatBackend;

use crate::chat::events::Submit;
use crate::chat::message::{BannerId, RequestId, clock_label_now};
use crate::chat::message_input::MessageInput;
use crate::chat::message_list::MessageList;
use crate::chat::transcript::{
    EMPTY_MESSAGE_ERROR, ERROR_BANNER_TTL, OutboundChat, SendOutcome, SendRejection, Transcript,
    outcome_from_result,
};

/// Widget controller: wires input events to the transcript, dispatches
/// backend calls, and applies their completions.
///
/// The transcript is the single source of truth; after every mutation the
/// visible cells are pushed into the message list wholesale. All mutations
/// run on the foreground executor, so completions are atomic with respect
/// to other UI events.
pub struct ChatView {
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    transcript: Transcript,
    backend: Arc<dyn ChatBackend>,
}

impl ChatView {
    pub fn new(backend: Arc<dyn ChatBackend>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.clone(), cx);
        })
        .detach();

        Self {
            message_list,
            message_input,
            transcript: Transcript::new(),
            backend,
        }
    }

    /// Drops the conversation and the session identifier. In-flight
    /// requests are not cancelled; their completions will find no
    /// placeholder and be dropped. The server is not notified.
    pub fn clear_conversation(&mut self, cx: &mut Context<Self>) {
        self.transcript.clear();
        tracing::info!("conversation cleared, session reset");
        self.sync_cells(cx);
    }

    fn handle_submit(&mut self, event: Submit, cx: &mut Context<Self>) {
        let stamp = clock_label_now();
        match self.transcript.begin_send(&event.content, &stamp) {
            Ok(outbound) => {
                // User turn and placeholder are staged; make them visible
                // before the request leaves the process.
                self.sync_cells(cx);
                self.dispatch_request(outbound, cx);
            }
            Err(SendRejection::EmptyMessage) => {
                self.surface_banner(EMPTY_MESSAGE_ERROR, cx);
            }
        }
    }

    /// Runs the HTTP exchange on the Tokio bridge and funnels the terminal
    /// outcome back onto the foreground executor. Overlapping sends each
    /// get their own detached task; completion order is whatever the
    /// network decides.
    fn dispatch_request(&mut self, outbound: OutboundChat, cx: &mut Context<Self>) {
        let OutboundChat {
            request_id,
            request,
        } = outbound;
        let backend = self.backend.clone();
        let call = Tokio::spawn(cx, async move { backend.send_message(request).await });

        cx.spawn(async move |this, cx| {
            let outcome = match call.await {
                Ok(result) => outcome_from_result(result),
                Err(join_error) => {
                    tracing::error!("chat request task failed: {join_error}");
                    SendOutcome::Failure {
                        banner: format!("Failed to connect: {join_error}"),
                    }
                }
            };

            let _ = this.update(cx, |this, cx| {
                this.finish_send(request_id, outcome, cx);
            });
        })
        .detach();
    }

    fn finish_send(&mut self, request_id: RequestId, outcome: SendOutcome, cx: &mut Context<Self>) {
        let stamp = clock_label_now();
        match self.transcript.apply_outcome(request_id, outcome, &stamp) {
            Ok(applied) => {
                if applied.adopted_session {
                    tracing::info!(session = ?self.transcript.session_id(), "adopted session from reply");
                }
                if let Some(banner_id) = applied.banner {
                    self.schedule_banner_expiry(banner_id, cx);
                }
                self.sync_cells(cx);
            }
            Err(rejection) => {
                // Second completion, or the conversation was cleared while
                // the request was in flight.
                tracing::warn!(?rejection, "dropping completion with no live placeholder");
            }
        }
    }

    fn surface_banner(&mut self, message: &str, cx: &mut Context<Self>) {
        let banner_id = self.transcript.push_banner(message);
        self.schedule_banner_expiry(banner_id, cx);
        self.sync_cells(cx);
    }

    fn schedule_banner_expiry(&mut self, banner_id: BannerId, cx: &mut Context<Self>) {
        cx.spawn(async move |this, cx| {
            cx.background_executor().timer(ERROR_BANNER_TTL).await;
            let _ = this.update(cx, |this, cx| {
                this.transcript.remove_banner(banner_id);
                this.sync_cells(cx);
            });
        })
        .detach();
    }

    fn sync_cells(&mut self, cx: &mut Context<Self>) {
        let cells = self.transcript.cells().to_vec();
        self.message_list.update(cx, |list, cx| {
            list.set_cells(cells, cx);
        });
        cx.notify();
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        v_flex()
            .id("chat-view")
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .child(
                div()
                    .id("chat-view-history")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-input")
                    .flex_shrink_0()
                    .w_full()
                    .child(self.message_input.clone()),
            )
    }
}
