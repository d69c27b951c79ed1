use once_cell::sync::Lazy;

use crate::models::Legend;

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "Sports",
        &[
            "Michael Jordan",
            "Serena Williams",
            "Pele",
            "Usain Bolt",
            "Muhammad Ali",
            "Wayne Gretzky",
            "Nadia Comaneci",
            "Diego Maradona",
        ],
    ),
    (
        "Music",
        &[
            "Freddie Mercury",
            "Elvis Presley",
            "Madonna",
            "Wolfgang Amadeus Mozart",
            "Bob Marley",
            "Michael Jackson",
            "Aretha Franklin",
            "David Bowie",
        ],
    ),
    (
        "Cinema",
        &[
            "Charlie Chaplin",
            "Marilyn Monroe",
            "Alfred Hitchcock",
            "Bruce Lee",
            "Audrey Hepburn",
            "Steven Spielberg",
            "Meryl Streep",
        ],
    ),
    (
        "History",
        &[
            "Cleopatra",
            "Napoleon Bonaparte",
            "Joan of Arc",
            "Genghis Khan",
            "Abraham Lincoln",
            "Nelson Mandela",
            "Julius Caesar",
        ],
    ),
    (
        "Science",
        &[
            "Albert Einstein",
            "Marie Curie",
            "Isaac Newton",
            "Nikola Tesla",
            "Charles Darwin",
            "Ada Lovelace",
            "Galileo Galilei",
        ],
    ),
    (
        "Myths",
        &[
            "Hercules",
            "Thor",
            "King Arthur",
            "Robin Hood",
            "Medusa",
            "Achilles",
        ],
    ),
];

static LEGENDS: Lazy<Vec<Legend>> = Lazy::new(|| {
    BUILTIN
        .iter()
        .flat_map(|(category, names)| names.iter().map(move |name| Legend::new(*name, *category)))
        .collect()
});

/// Cards shipped with the game, grouped by category in display order.
pub fn legends() -> Vec<Legend> {
    LEGENDS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_cards() {
        for (category, names) in BUILTIN {
            assert!(!names.is_empty(), "{category} has no legends");
        }
        assert_eq!(
            legends().len(),
            BUILTIN.iter().map(|(_, names)| names.len()).sum::<usize>()
        );
    }
}
