//! The topic catalogue shown in the demo list.

const ICONS: &[&str] = &[
    "white_rabbit",
    "bat",
    "chameleon",
    "kangaroo",
    "elephant",
    "crocodile",
    "rooster",
    "dog",
    "walrus",
    "stingray",
    "husky",
    "hippo",
    "monkey",
    "raccoon",
    "butterfly",
    "beetle",
    "macaw",
    "whale",
];

const TITLES: &[&str] = &[
    "Arts & Crafts",
    "Beauty",
    "Books",
    "Business",
    "Comics",
    "Culinary",
    "Design",
    "Writing",
    "Religion",
    "Technology",
    "Social sciences",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    pub icon: &'static str,
}

/// Picks an icon name at random. Falls back to the first icon when the
/// system has no entropy to give.
pub fn random_icon() -> &'static str {
    let index = match getrandom::u32() {
        Ok(value) => value as usize % ICONS.len(),
        Err(err) => {
            log::warn!("no entropy for icon choice: {err}");
            0
        }
    };
    ICONS[index]
}

/// Every title twice, each with a random icon.
pub fn catalogue() -> Vec<Topic> {
    TITLES
        .iter()
        .chain(TITLES.iter())
        .map(|title| Topic {
            title: (*title).to_string(),
            icon: random_icon(),
        })
        .collect()
}

pub fn is_known_icon(name: &str) -> bool {
    ICONS.contains(&name)
}
