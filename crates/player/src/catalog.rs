// Static station catalog

/// One entry of the catalog. `url` points at the playlist indirection,
/// not at the stream itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

const fn station(name: &'static str, url: &'static str, description: &'static str) -> Station {
    Station { name, url, description }
}

/// Compiled-in SomaFM channels
pub static STATIONS: &[Station] = &[
    station("Groove Salad", "https://somafm.com/groovesalad256.pls", "A nicely chilled plate of ambient/downtempo beats and grooves."),
    station("Drone Zone", "https://somafm.com/dronezone256.pls", "Served best chilled, safe with most medications. Atmospheric textures with minimal beats."),
    station("Space Station Soma", "https://somafm.com/spacestation.pls", "Tune in, turn on, space out. Spaced-out ambient and mid-tempo electronica."),
    station("Deep Space One", "https://somafm.com/deepspaceone.pls", "Deep ambient electronic, experimental and space music. For inner and outer space exploration."),
    station("Secret Agent", "https://somafm.com/secretagent.pls", "The soundtrack for your stylish, mysterious, dangerous life. For Spies and PIs too!"),
    station("Groove Salad Classic", "https://somafm.com/gsclassic.pls", "The classic and influential downtempo electronica channel from SomaFM."),
    station("Underground 80s", "https://somafm.com/u80s256.pls", "Early 80s UK Synthpop and a bit of New Wave."),
    station("Synphaera Radio", "https://somafm.com/synphaera256.pls", "Ambient, techno and electronic music from the underground."),
    station("Beat Blender", "https://somafm.com/beatblender.pls", "A late night blend of deep-house and downtempo chill."),
    station("DEF CON Radio", "https://somafm.com/defcon256.pls", "Music for Hacking. The DEF CON Year-Round Channel."),
    station("The Trip", "https://somafm.com/thetrip.pls", "Progressive house / trance. Tip top tunes."),
    station("Sonic Universe", "https://somafm.com/sonicuniverse256.pls", "Transcending the world of jazz with eclectic, avant-garde takes on tradition."),
    station("Seven Inch Soul", "https://somafm.com/7soul.pls", "Vintage soul tracks from the original 45 RPM vinyl."),
    station("Cliqhop", "https://somafm.com/cliqhop256.pls", "Blips'n'beeps backed mostly w/beats. Intelligent Dance Music."),
    station("Illinois Street Lounge", "https://somafm.com/illstreet.pls", "Classic bachelor pad, playful exotica and vintage music of tomorrow."),
    station("Fluid", "https://somafm.com/fluid.pls", "NEW! Drown in the electronic sound of instrumental hiphop, future soul and liquid trap."),
    station("Reggae", "https://somafm.com/reggae256.pls", "Vintage Reggae and Dub"),
    station("Mission Control", "https://somafm.com/missioncontrol.pls", "Celebrating NASA and Space Explorers everywhere."),
    station("The Darkroom", "https://somafm.com/darkzone256.pls", "Indie pop and chillout tracks with an edge."),
    station("Dub Step Beyond", "https://somafm.com/dubstep256.pls", "Dubstep, Dub and Deep Bass. May damage speakers at high volume."),
    station("SF 10-33", "https://somafm.com/sf1033.pls", "Ambient music mixed with the sounds of San Francisco public safety radio traffic."),
    station("Vaporwaves", "https://somafm.com/vaporwaves.pls", "A nostalgic journey through 80s and 90s internet and computer culture."),
    station("Metal Detector", "https://somafm.com/metal.pls", "From black to doom, prog to sludge, thrash to post, stoner to crossover, punk to industrial."),
    station("Specials", "https://somafm.com/specials.pls", "A selection of special broadcasts and one-time events."),
    station("n5MD Radio", "https://somafm.com/n5md.pls", "Ambient and IDM music from the n5MD label."),
    station("Scanner: Dark Ambient", "https://somafm.com/scanner.pls", "Dark ambient music for the mind's eye."),
    station("SF in SF", "https://somafm.com/sfinsf.pls", "Science fiction, fantasy, and horror from the SF in SF reading series."),
];

/// Ordered, read-only list of stations
#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<Station>,
}

impl Catalog {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    /// Move `delta` steps from `current`, wrapping in both directions.
    /// Returns `None` for an empty catalog.
    pub fn wrap_index(&self, current: usize, delta: isize) -> Option<usize> {
        if self.stations.is_empty() {
            return None;
        }
        let len = self.stations.len() as isize;
        let current = (current % self.stations.len()) as isize;
        Some((current + delta).rem_euclid(len) as usize)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(STATIONS.to_vec())
    }
}
