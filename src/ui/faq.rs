use iced::{
    widget::{button, column, row, text, Column, Space},
    Alignment, Element, Length,
};

/// One disclosure item. Items never share state.
#[derive(Debug, Clone)]
pub struct FaqItem {
    pub question: &'static str,
    pub answer: &'static str,
    expanded: bool,
}

impl FaqItem {
    pub fn new(question: &'static str, answer: &'static str) -> Self {
        Self {
            question,
            answer,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

#[derive(Debug, Clone)]
pub struct Faq {
    items: Vec<FaqItem>,
}

impl Default for Faq {
    fn default() -> Self {
        Self::new(vec![
            FaqItem::new(
                "Which links are supported?",
                "Public Instagram posts and reels, e.g. https://www.instagram.com/reel/<code>/.",
            ),
            FaqItem::new(
                "Why does the first request sometimes take longer?",
                "The download server sleeps when idle. The app waits and retries once while it wakes up.",
            ),
            FaqItem::new(
                "Can I download private videos?",
                "No. Only content that is publicly visible can be fetched.",
            ),
            FaqItem::new(
                "Where is the video saved?",
                "Wherever you choose in the save dialog. You can also copy the direct link instead.",
            ),
        ])
    }
}

impl Faq {
    pub fn new(items: Vec<FaqItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[FaqItem] {
        &self.items
    }

    /// Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.expanded = !item.expanded;
        }
    }

    pub fn view(&self) -> Element<'_, usize> {
        let mut list = Column::new().spacing(6);

        for (index, item) in self.items().iter().enumerate() {
            let marker = if item.is_expanded() { "−" } else { "+" };
            let trigger = button(
                row![
                    text(item.question).size(15),
                    Space::new().width(Length::Fill),
                    text(marker).size(15),
                ]
                .align_y(Alignment::Center),
            )
            .style(button::text)
            .width(Length::Fill)
            .on_press(index);

            list = list.push(trigger);
            if item.is_expanded() {
                list = list.push(text(item.answer).size(14));
            }
        }

        column![text("FAQ").size(20), list].spacing(10).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_independent_per_item() {
        let mut faq = Faq::default();
        faq.toggle(1);
        faq.toggle(2);
        faq.toggle(2);

        let expanded: Vec<bool> = faq.items().iter().map(FaqItem::is_expanded).collect();
        assert_eq!(expanded, vec![false, true, false, false]);
    }

    #[test]
    fn test_toggle_out_of_range_is_noop() {
        let mut faq = Faq::new(vec![FaqItem::new("q", "a")]);
        faq.toggle(5);
        assert!(!faq.items()[0].is_expanded());
    }
}
