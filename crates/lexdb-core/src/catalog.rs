//! Static catalog of legal acts the router can dispatch to.
//!
//! The catalog is built once at startup and injected wherever act names are
//! resolved; nothing mutates it afterwards, so it is shared freely across
//! concurrently served queries.

use crate::error::{Error, Result};

/// One routable act: canonical partition name, trigger phrases, tie-break
/// weight. `name` must match `ChunkMetadata::act_name` on every chunk of the
/// act exactly, otherwise routed queries fall through to unfiltered search.
#[derive(Debug, Clone)]
pub struct ActDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub priority: i32,
}

impl ActDefinition {
    pub fn new(name: &str, aliases: &[&str], priority: i32) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            priority,
        }
    }
}

/// Immutable, validated collection of [`ActDefinition`]s in declaration order.
#[derive(Debug, Clone)]
pub struct ActCatalog {
    acts: Vec<ActDefinition>,
}

impl ActCatalog {
    /// Build a catalog, rejecting duplicate act names.
    pub fn new(acts: Vec<ActDefinition>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for act in &acts {
            if !seen.insert(act.name.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate act name in catalog: {}",
                    act.name
                )));
            }
        }
        Ok(Self { acts })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActDefinition> {
        self.acts.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.acts.iter().any(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.acts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    /// The default catalog: Polish procedure codes, substantive codes and the
    /// constitution, with alias phrases tuned for free-text questions.
    pub fn polish_statutes() -> Self {
        let acts = vec![
            ActDefinition::new(
                "Kodeks postępowania karnego",
                &[
                    "kpk", "kodeks postępowania karnego", "postępowania karnego", "proces karny",
                    "postępowanie przygotowawcze", "akt oskarżenia", "oskarżony", "pokrzywdzony",
                    "prokurator", "śledztwo", "dochodzenie", "tymczasowe aresztowanie",
                ],
                120,
            ),
            ActDefinition::new(
                "Kodeks postępowania cywilnego",
                &[
                    "kpc", "kodeks postępowania cywilnego", "postępowania cywilnego", "pozew",
                    "powód", "pozwany", "apelacja", "zażalenie", "nakaz zapłaty", "egzekucja",
                    "komornik", "klauzula wykonalności", "zabezpieczenie",
                ],
                120,
            ),
            ActDefinition::new(
                "Kodeks postępowania administracyjnego",
                &[
                    "kpa", "kodeks postępowania administracyjnego",
                    "postępowania administracyjnego", "organ administracji",
                    "decyzja administracyjna", "postanowienie", "strona postępowania",
                    "doręczenia", "odwołanie", "wznowienie postępowania",
                    "stwierdzenie nieważności",
                ],
                120,
            ),
            ActDefinition::new(
                "Kodeks postępowania w sprawach o wykroczenia",
                &[
                    "kpw", "postępowania w sprawach o wykroczenia", "wniosek o ukaranie",
                    "obwiniony", "sprzeciw", "mandat karny", "postępowanie przyspieszone",
                ],
                110,
            ),
            ActDefinition::new(
                "Kodeks wyborczy",
                &[
                    "kodeks wyborczy", "wybory", "głosowanie", "komisja wyborcza",
                    "komitet wyborczy", "okręg wyborczy", "referendum", "kampania wyborcza",
                ],
                105,
            ),
            ActDefinition::new(
                "Kodeks Karny",
                &[
                    "kodeks karny", "kodeksu karnego", "kk", "przestępstwo", "kara", "wina",
                    "zamiar", "nieumyślność", "usiłowanie", "współsprawstwo",
                    "warunkowe umorzenie", "kradzież", "kradzież z włamaniem", "rozbój",
                ],
                100,
            ),
            ActDefinition::new(
                "Kodeks karny skarbowy",
                &[
                    "kodeks karny skarbowy", "kks", "przestępstwo skarbowe",
                    "wykroczenie skarbowe", "uszczuplenie", "podatek", "akcyza", "cło",
                    "faktura", "skarbowy",
                ],
                100,
            ),
            ActDefinition::new(
                "Kodeks karny wykonawczy",
                &[
                    "kodeks karny wykonawczy", "kkw", "wykonywanie kary", "zakład karny",
                    "warunkowe zwolnienie", "system wykonywania kary", "dozór", "readaptacja",
                ],
                95,
            ),
            ActDefinition::new(
                "Kodeks wykroczeń",
                &["kodeks wykroczeń", "wykroczenie", "mandat", "areszt", "nagana", "grzywna", "kw"],
                95,
            ),
            ActDefinition::new(
                "Kodeks pracy",
                &[
                    "kodeks pracy", "stosunek pracy", "pracownik", "pracodawca",
                    "umowa o pracę", "czas pracy", "urlop", "wynagrodzenie", "wypowiedzenie",
                    "zwolnienie dyscyplinarne", "kp",
                ],
                95,
            ),
            ActDefinition::new(
                "Kodeks rodzinny i opiekuńczy",
                &[
                    "kro", "kodeks rodzinny", "rodzinny i opiekuńczy", "małżeństwo", "rozwód",
                    "separacja", "alimenty", "władza rodzicielska", "przysposobienie",
                ],
                95,
            ),
            ActDefinition::new(
                "Kodeks spółek handlowych",
                &[
                    "ksh", "kodeks spółek handlowych", "spółka z o.o.", "spółka akcyjna",
                    "zarząd", "rada nadzorcza", "zgromadzenie wspólników", "akcjonariusz",
                    "kapitał zakładowy",
                ],
                90,
            ),
            ActDefinition::new(
                "Kodeks cywilny",
                &[
                    "kodeks cywilny", "kc", "zobowiązanie", "umowa", "odszkodowanie",
                    "odpowiedzialność", "rękojmia", "przedawnienie", "własność", "posiadanie",
                ],
                90,
            ),
            ActDefinition::new(
                "Ordynacja podatkowa",
                &[
                    "ordynacja podatkowa", "zobowiązanie podatkowe", "organ podatkowy",
                    "postępowanie podatkowe", "interpretacja", "deklaracja", "ulga",
                    "przedawnienie podatkowe",
                ],
                90,
            ),
            ActDefinition::new(
                "Kodeks morski",
                &[
                    "kodeks morski", "statek", "armator", "kapitan", "żegluga", "czarter",
                    "konosament", "awaria wspólna",
                ],
                70,
            ),
            ActDefinition::new(
                "Konstytucja Rzeczypospolitej Polskiej",
                &[
                    "konstytucja", "konstytucja rp", "sejm", "senat", "prezydent",
                    "trybunał konstytucyjny", "rzecznik praw obywatelskich", "wolności i prawa",
                ],
                85,
            ),
        ];
        // The built-in catalog has no duplicate names.
        Self { acts }
    }
}
