//! The classic 42-region world map.
//!
//! Each entry lists a region followed by its neighbours. The table is
//! symmetric: if A lists B then B lists A. Continent membership partitions
//! the regions. All data is compile-time `static`; `MapDefinition::classic`
//! validates and indexes it once.

/// Number of regions on the classic map.
pub const CLASSIC_REGION_COUNT: usize = 42;

/// Number of continents on the classic map.
pub const CLASSIC_CONTINENT_COUNT: usize = 6;

/// Region adjacency table, in canonical region order.
pub static CLASSIC_ADJACENCY: [(&str, &[&str]); CLASSIC_REGION_COUNT] = [
    // North America
    ("Alaska", &["Northwest_Territory", "Alberta", "Kamchatka"]),
    ("Northwest_Territory", &["Alaska", "Greenland", "Alberta", "Ontario"]),
    ("Alberta", &["Alaska", "Northwest_Territory", "Ontario", "Western_US"]),
    ("Ontario", &["Northwest_Territory", "Alberta", "Quebec", "Greenland", "Western_US", "Eastern_US"]),
    ("Greenland", &["Northwest_Territory", "Ontario", "Quebec", "Iceland"]),
    ("Quebec", &["Greenland", "Ontario", "Eastern_US"]),
    ("Eastern_US", &["Quebec", "Ontario", "Western_US", "Central_America"]),
    ("Western_US", &["Alberta", "Ontario", "Eastern_US", "Central_America"]),
    ("Central_America", &["Western_US", "Eastern_US", "Venezuela"]),
    // South America
    ("Venezuela", &["Central_America", "Brazil", "Peru"]),
    ("Peru", &["Venezuela", "Brazil", "Argentina"]),
    ("Argentina", &["Peru", "Brazil"]),
    ("Brazil", &["Venezuela", "Peru", "Argentina", "North_Africa"]),
    // Africa
    ("North_Africa", &["Brazil", "Western_Europe", "Southern_Europe", "Egypt", "East_Africa", "Congo"]),
    ("Egypt", &["North_Africa", "Southern_Europe", "Middle_East", "East_Africa"]),
    ("East_Africa", &["Egypt", "Middle_East", "Congo", "Madagascar", "South_Africa", "North_Africa"]),
    ("Congo", &["North_Africa", "East_Africa", "South_Africa"]),
    ("South_Africa", &["Congo", "East_Africa", "Madagascar"]),
    ("Madagascar", &["East_Africa", "South_Africa"]),
    // Europe
    ("Western_Europe", &["North_Africa", "Southern_Europe", "Northern_Europe", "Great_Britain"]),
    ("Great_Britain", &["Iceland", "Scandinavia", "Northern_Europe", "Western_Europe"]),
    ("Iceland", &["Greenland", "Scandinavia", "Great_Britain"]),
    ("Scandinavia", &["Iceland", "Great_Britain", "Northern_Europe", "Ukraine"]),
    ("Northern_Europe", &["Western_Europe", "Great_Britain", "Scandinavia", "Ukraine", "Southern_Europe"]),
    ("Southern_Europe", &["Western_Europe", "Northern_Europe", "Ukraine", "North_Africa", "Egypt", "Middle_East"]),
    ("Ukraine", &["Scandinavia", "Northern_Europe", "Southern_Europe", "Middle_East", "Afghanistan", "Ural"]),
    // Asia
    ("Middle_East", &["Southern_Europe", "Egypt", "East_Africa", "Ukraine", "Afghanistan", "India"]),
    ("India", &["Middle_East", "Afghanistan", "China", "Siam"]),
    ("Siam", &["India", "China", "Indonesia"]),
    // Australia
    ("Indonesia", &["Siam", "New_Guinea", "Western_Australia"]),
    ("New_Guinea", &["Indonesia", "Western_Australia", "Eastern_Australia"]),
    ("Western_Australia", &["Indonesia", "New_Guinea", "Eastern_Australia"]),
    ("Eastern_Australia", &["Western_Australia", "New_Guinea"]),
    // Asia (continued)
    ("China", &["Siam", "India", "Afghanistan", "Ural", "Siberia", "Mongolia"]),
    ("Afghanistan", &["Ukraine", "Middle_East", "India", "Ural", "China"]),
    ("Ural", &["Ukraine", "Afghanistan", "China", "Siberia"]),
    ("Siberia", &["Ural", "China", "Mongolia", "Irkutsk", "Yakutsk"]),
    ("Mongolia", &["China", "Japan", "Kamchatka", "Irkutsk", "Siberia"]),
    ("Japan", &["Mongolia", "Kamchatka"]),
    ("Irkutsk", &["Siberia", "Yakutsk", "Kamchatka", "Mongolia"]),
    ("Yakutsk", &["Siberia", "Irkutsk", "Kamchatka"]),
    ("Kamchatka", &["Japan", "Irkutsk", "Yakutsk", "Mongolia", "Alaska"]),
];

/// Continents: (name, bonus, members).
pub static CLASSIC_CONTINENTS: [(&str, u32, &[&str]); CLASSIC_CONTINENT_COUNT] = [
    (
        "North America",
        5,
        &[
            "Alaska", "Northwest_Territory", "Alberta", "Ontario", "Quebec",
            "Western_US", "Eastern_US", "Central_America", "Greenland",
        ],
    ),
    ("South America", 2, &["Venezuela", "Brazil", "Peru", "Argentina"]),
    (
        "Europe",
        5,
        &[
            "Iceland", "Great_Britain", "Western_Europe", "Northern_Europe",
            "Southern_Europe", "Ukraine", "Scandinavia",
        ],
    ),
    (
        "Africa",
        3,
        &["North_Africa", "Egypt", "East_Africa", "Congo", "South_Africa", "Madagascar"],
    ),
    (
        "Asia",
        7,
        &[
            "Middle_East", "Afghanistan", "India", "China", "Siberia", "Yakutsk",
            "Irkutsk", "Mongolia", "Kamchatka", "Japan", "Ural", "Siam",
        ],
    ),
    (
        "Australia",
        2,
        &["Indonesia", "New_Guinea", "Western_Australia", "Eastern_Australia"],
    ),
];
