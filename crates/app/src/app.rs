use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::chat::ChatView;

gpui::actions!(shell, [ClearConversation, Quit]);

/// Header bar height.
const HEADER_HEIGHT: Pixels = px(48.);

/// Application shell: a header with the clear trigger above the chat view.
pub struct ChatShell {
    chat_view: Entity<ChatView>,
}

impl ChatShell {
    pub fn new(chat_view: Entity<ChatView>, _window: &mut Window, _cx: &mut Context<Self>) -> Self {
        Self { chat_view }
    }

    fn clear_chat(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.clear_conversation(cx));
    }
}

impl Render for ChatShell {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-shell")
            .size_full()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &ClearConversation, _window, cx| {
                this.clear_chat(cx);
            }))
            .child(
                h_flex()
                    .id("chat-shell-header")
                    .h(HEADER_HEIGHT)
                    .px_4()
                    .items_center()
                    .justify_between()
                    .border_b_1()
                    .border_color(theme.border)
                    .child(
                        div()
                            .text_sm()
                            .font_weight(FontWeight::MEDIUM)
                            .text_color(theme.foreground)
                            .child("Parley"),
                    )
                    .child(
                        Button::new("clear-chat")
                            .ghost()
                            .small()
                            .icon(IconName::CircleX)
                            .child("Clear")
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.clear_chat(cx);
                            })),
                    ),
            )
            .child(
                div()
                    .id("chat-shell-body")
                    .flex_1()
                    .min_h_0()
                    .overflow_hidden()
                    .child(self.chat_view.clone()),
            )
    }
}
