use iced::{
    widget::{container, sensor, text},
    Element, Length,
};

const SLOT_HEIGHT: f32 = 90.0;
/// Start loading a little before the slot scrolls into view
const ANTICIPATE_PX: f32 = 80.0;

#[derive(Debug, Clone)]
pub struct AdSlot {
    pub slot: &'static str,
    loaded: bool,
}

impl AdSlot {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[derive(Debug, Clone)]
pub struct AdSlots {
    slots: Vec<AdSlot>,
}

impl Default for AdSlots {
    fn default() -> Self {
        Self::new(&["top-banner", "bottom-banner"])
    }
}

impl AdSlots {
    pub fn new(slots: &[&'static str]) -> Self {
        Self {
            slots: slots
                .iter()
                .map(|&slot| AdSlot {
                    slot,
                    loaded: false,
                })
                .collect(),
        }
    }

    pub fn slots(&self) -> &[AdSlot] {
        &self.slots
    }

    /// Returns `true` only the first time a slot becomes visible.
    pub fn mark_loaded(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if !slot.loaded => {
                slot.loaded = true;
                tracing::debug!(slot = slot.slot, "ad slot loaded");
                true
            }
            _ => false,
        }
    }

    /// The slot keeps its height before and after loading so the layout never jumps.
    pub fn view(&self, index: usize) -> Element<'_, usize> {
        let Some(slot) = self.slots().get(index) else {
            return container(text("")).height(Length::Shrink).into();
        };

        let body = if slot.is_loaded() {
            text("Advertisement").size(12)
        } else {
            text("").size(12)
        };

        let placeholder = container(body)
            .width(Length::Fill)
            .height(Length::Fixed(SLOT_HEIGHT))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(SLOT_HEIGHT))
            .style(container::bordered_box);

        if slot.is_loaded() {
            placeholder.into()
        } else {
            sensor(placeholder)
                .on_show(move |_| index)
                .anticipate(ANTICIPATE_PX)
                .into()
        }
    }
}
