use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, text::TextView, v_flex, v_virtual_list};

use crate::chat::message::{BannerId, HistoryCell, RequestId, Role, Turn, TurnId};
use crate::chat::scroll_manager::ScrollManager;

/// Fixed leading element of the history view. It survives `clear` because
/// it is not a history cell at all.
pub const WELCOME_MESSAGE: &str = "Hi! Ask a question below to get started.";

const DEFAULT_CONTENT_WIDTH: Pixels = px(640.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const USER_BUBBLE_MAX_WIDTH: Pixels = px(480.);
const USER_BUBBLE_PADDING_X: Pixels = px(14.);
const USER_BUBBLE_PADDING_Y: Pixels = px(10.);
const STAMP_ROW_HEIGHT: Pixels = px(16.);
const STAMP_ROW_GAP: Pixels = px(4.);
const BOT_LABEL_HEIGHT: Pixels = px(16.);
const BOT_LABEL_GAP: Pixels = px(8.);
const WELCOME_HEIGHT: Pixels = px(64.);
const LOADING_ROW_HEIGHT: Pixels = px(28.);
const BANNER_PADDING_Y: Pixels = px(8.);
const LOADING_DOT_SIZE: Pixels = px(7.);
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

/// Cache key for measured row heights. Cells are append-only and never
/// mutate, so one measurement per key is enough; there is no invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Welcome,
    Turn(TurnId),
    Loading(RequestId),
    Banner(BannerId),
}

fn row_key(cell: &HistoryCell) -> RowKey {
    match cell {
        HistoryCell::Turn(turn) => RowKey::Turn(turn.id),
        HistoryCell::Loading(request_id) => RowKey::Loading(*request_id),
        HistoryCell::Banner(banner) => RowKey::Banner(banner.id),
    }
}

/// Scrolling history view: the fixed welcome element followed by the
/// transcript's cells, newest at the bottom.
pub struct MessageList {
    cells: Vec<HistoryCell>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_manager: ScrollManager,
    measured_heights: HashMap<RowKey, Pixels>,
    content_width: Option<Pixels>,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        let mut list = Self {
            cells: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_manager: ScrollManager::new(),
            measured_heights: HashMap::new(),
            content_width: None,
        };
        list.rebuild_item_sizes();
        list
    }

    pub fn cells(&self) -> &[HistoryCell] {
        &self.cells
    }

    /// Replaces the visible cells and follows the newest entry. A
    /// completion swaps a loading cell for a turn or banner without
    /// changing the count, so equal length still counts as an append; only
    /// shrinking (banner expiry, clear) leaves the scroll position alone.
    pub fn set_cells(&mut self, cells: Vec<HistoryCell>, cx: &mut Context<Self>) {
        let appended = !cells.is_empty() && cells.len() >= self.cells.len();
        self.cells = cells;

        let live_keys: Vec<RowKey> = self.cells.iter().map(row_key).collect();
        self.measured_heights
            .retain(|key, _| *key == RowKey::Welcome || live_keys.contains(key));

        self.rebuild_item_sizes();
        if appended {
            self.scroll_manager.request_scroll_to_bottom();
        }
        cx.notify();
    }

    fn row_count(&self) -> usize {
        self.cells.len() + 1
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll_manager.handle().bounds().size.width;
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let changed = self
            .content_width
            .is_none_or(|current| (f32::from(current) - f32::from(next_width)).abs() > 1.0);

        if changed {
            self.content_width = Some(next_width);
            // Wrapped line counts depend on the width, so measurements from
            // the old width are useless.
            self.measured_heights.clear();
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let mut sizes = Vec::with_capacity(self.row_count());

        let welcome_height = self
            .measured_heights
            .get(&RowKey::Welcome)
            .copied()
            .unwrap_or(WELCOME_HEIGHT);
        sizes.push(size(px(0.), welcome_height));

        for cell in &self.cells {
            let height = self
                .measured_heights
                .get(&row_key(cell))
                .copied()
                .unwrap_or_else(|| estimate_cell_height(cell, content_width));
            sizes.push(size(px(0.), height));
        }

        self.item_sizes = Rc::new(sizes);
    }

    fn measure_visible_rows(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );

        let mut updated = false;
        for index in visible_range {
            let key = if index == 0 {
                RowKey::Welcome
            } else {
                match self.cells.get(index - 1) {
                    Some(cell) => row_key(cell),
                    None => continue,
                }
            };

            if self.measured_heights.contains_key(&key) {
                continue;
            }

            let mut row = self.render_row(index, window, cx);
            let measured = row.layout_as_root(available_space, window, cx).height;
            self.measured_heights.insert(key, measured);
            updated = true;
        }

        if updated {
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn render_row(&self, index: usize, window: &mut Window, cx: &mut Context<Self>) -> AnyElement {
        if index == 0 {
            return self.render_welcome(cx);
        }

        match self.cells.get(index - 1) {
            Some(HistoryCell::Turn(turn)) if turn.role == Role::User => {
                self.render_user_turn(turn, cx)
            }
            Some(HistoryCell::Turn(turn)) => self.render_bot_turn(turn, window, cx),
            Some(HistoryCell::Loading(request_id)) => self.render_loading(*request_id, cx),
            Some(HistoryCell::Banner(banner)) => self.render_banner(banner.message.clone(), cx),
            None => div().into_any_element(),
        }
    }

    fn render_welcome(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .w_full()
            .gap_1()
            .child(
                Label::new("Assistant")
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(Label::new(WELCOME_MESSAGE).text_sm())
            .into_any_element()
    }

    fn render_user_turn(&self, turn: &Turn, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let content = if turn.content.is_empty() {
            " ".to_string()
        } else {
            turn.content.clone()
        };

        v_flex()
            .w_full()
            .items_end()
            .gap_1()
            .child(
                div()
                    .max_w(USER_BUBBLE_MAX_WIDTH)
                    .px(USER_BUBBLE_PADDING_X)
                    .py(USER_BUBBLE_PADDING_Y)
                    .rounded_lg()
                    .bg(theme.accent)
                    .text_color(theme.accent_foreground)
                    .child(Label::new(content).text_sm()),
            )
            .child(
                Label::new(turn.stamp.clone())
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .into_any_element()
    }

    fn render_bot_turn(&self, turn: &Turn, window: &mut Window, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let markdown_id = ElementId::Name(SharedString::from(format!("bot-markdown-{}", turn.id.0)));

        // Bot content is server-authored markup and renders unescaped by
        // contract; only the backend feeds this path.
        let content = TextView::markdown(markdown_id, turn.content.clone(), window, cx)
            .selectable(true)
            .into_any_element();

        v_flex()
            .w_full()
            .gap_1()
            .child(
                Label::new("Assistant")
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(content)
            .child(
                Label::new(turn.stamp.clone())
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .into_any_element()
    }

    fn render_loading(&self, request_id: RequestId, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let mut dots = h_flex().h(LOADING_ROW_HEIGHT).items_center().gap_1();

        // Three pulsing dots; slightly different periods keep them out of
        // phase without any shared animation clock.
        for (slot, period_ms) in [(0u64, 450u64), (1, 600), (2, 750)] {
            dots = dots.child(
                div()
                    .size(LOADING_DOT_SIZE)
                    .rounded_full()
                    .bg(theme.primary)
                    .with_animation(
                        ElementId::Name(SharedString::from(format!(
                            "loading-dot-{}-{slot}",
                            request_id.0
                        ))),
                        Animation::new(std::time::Duration::from_millis(period_ms))
                            .repeat()
                            .with_easing(pulsating_between(0.3, 1.0)),
                        |dot, delta| dot.opacity(delta),
                    ),
            );
        }

        dots.into_any_element()
    }

    fn render_banner(&self, message: String, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        div()
            .w_full()
            .px_3()
            .py(BANNER_PADDING_Y)
            .rounded_lg()
            .border_1()
            .border_color(theme.danger)
            .child(Label::new(message).text_sm().text_color(theme.danger))
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        self.scroll_manager.apply_pending_scroll();

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "history",
                self.item_sizes.clone(),
                |this, visible_range: Range<usize>, window, cx| {
                    this.update_content_width(cx);
                    this.measure_visible_rows(visible_range.clone(), window, cx);
                    visible_range
                        .map(|index| this.render_row(index, window, cx))
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_4()
            .py_3()
            .gap_3()
            .track_scroll(self.scroll_manager.handle()),
        )
    }
}

fn estimate_cell_height(cell: &HistoryCell, content_width: Pixels) -> Pixels {
    match cell {
        HistoryCell::Turn(turn) if turn.role == Role::User => {
            let bubble_width = min_pixels(content_width, USER_BUBBLE_MAX_WIDTH);
            let text_width = max_pixels(px(1.), bubble_width - USER_BUBBLE_PADDING_X * 2);
            estimate_text_height(&turn.content, text_width)
                + USER_BUBBLE_PADDING_Y * 2
                + STAMP_ROW_GAP
                + STAMP_ROW_HEIGHT
        }
        HistoryCell::Turn(turn) => {
            BOT_LABEL_HEIGHT
                + BOT_LABEL_GAP
                + estimate_text_height(&turn.content, content_width)
                + STAMP_ROW_GAP
                + STAMP_ROW_HEIGHT
        }
        HistoryCell::Loading(_) => LOADING_ROW_HEIGHT,
        HistoryCell::Banner(banner) => {
            estimate_text_height(&banner.message, content_width) + BANNER_PADDING_Y * 2
        }
    }
}

fn estimate_text_height(content: &str, width: Pixels) -> Pixels {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (f32::from(width) / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;
    let mut line_count = 0usize;
    for line in content.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}
