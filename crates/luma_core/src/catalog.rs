//! Fixed seed catalog and curated author collections.
//!
//! # Responsibility
//! - Provide the default library used when nothing valid is stored.
//! - Provide the fallback record shown when a detail id resolves nowhere.
//!
//! # Invariants
//! - Seed ids are unique and stable across releases; stored libraries and
//!   seed lookups rely on them.
//! - Order is the display order of a fresh library.

use crate::model::book::{Book, ReadingStatus};

/// Generic cover used for recommendation stubs.
pub const RECOMMENDATION_COVER_URL: &str =
    "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?q=80&w=2730&auto=format&fit=crop";

/// Generic cover used for text search results.
pub const SEARCH_COVER_URL: &str =
    "https://images.unsplash.com/photo-1519681393784-d120267933ba?q=80&w=2940&auto=format&fit=crop";

/// Inclusive start-year window of the "golden age" author collection.
pub const GOLDEN_AGE_YEARS: std::ops::RangeInclusive<u32> = 1500..=1950;

struct SeedEntry {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    year: Option<&'static str>,
    status: ReadingStatus,
    cover_url: &'static str,
}

const SEED_ENTRIES: &[SeedEntry] = &[
    SeedEntry {
        id: "meditations",
        title: "Meditations",
        author: "Marcus Aurelius",
        year: None,
        status: ReadingStatus::Read,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuBgQZmOX2-yN6m7nlAur4cdPBx-78HU7niNfkm8oowhdAYwbim_9Kwi_4qcI-rVBBFfxtK74g_Gju2cgYp2gkYuLBobJ938bi--R7szq8C-5JiOMBkqywv3XMY4aW6IL-CtnJ9xV0F_-grvudu2dc-KzNpMor338aWWjM3m5SEoLBh8TimToV8UoJT4GBtt6Hw-83n395cGUSyFatFonJEq4Y70lwUf7dOqn1ITrtVQGxYWkxrLw2a5_LMuF5vXP8pjOxJEcLRAmzJd",
    },
    SeedEntry {
        id: "fifth-season",
        title: "The Fifth Season",
        author: "N. K. Jemisin",
        year: Some("2015"),
        status: ReadingStatus::Read,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuAG_Se529IBFAay6EP0t0aO_ROPbTHJMQec7zfmEkKbNukA0GSSx6jHPlrCTpAG4bU_yFIlJpRSOcnF9TDR7qPL1AR5RruR3QYQIOk2b4nyODwVs5WvQuxGx2BK6VX1PLJQy5r1H4Klp0-UnNrmlDcfibnFSI1w7euvsf1--Aalnukp-z62KaxIR0qKL13eDpRLACuSdIVwwjhwFNZMXzVRLH4MSst1NtqFE2U_0vdzco1S2GpE0QdACMfiRshyM4hT6zq06gAlKoku",
    },
    SeedEntry {
        id: "psalm-wild",
        title: "A Psalm for the Wild-Built",
        author: "Becky Chambers",
        year: Some("2021"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuAciyxHSkpbDTfaB3EhLMiELRITJALE6hWQngIpUFBnovdBezAoJWxGxj-IYsEHyNYCyj6ZLD7pTogHC7gvEEFd4K8bX_0PwSLQ-DcbZDO27r88_2hOjoTR540Egk8Nc89oTY7Rsd8QbnEyYjbg7LLTFTOMFg8uv_25rVYyM19VCU9u5VwCH1TQLD6Dfq7wa56iWTjiImSo9hadAXi16uPtzgK5YUXFdqExKd3djTvEfmeDd0R_04skTn48oAjE6zUqfOqTJ5Fwpe-Y",
    },
    SeedEntry {
        id: "parable-sower",
        title: "Parable of the Sower",
        author: "Octavia E. Butler",
        year: Some("1993"),
        status: ReadingStatus::Reading,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuBLPf2RHnOKWg_3qrv5JwoI61RMeqeCy7XmlvRiFVU7DlCVJpG9ZI1B-hAgtOavglapw-BOOq1erokvVPCzQR86IQqstuwvX0GtTK-s-JYS1tBk1ZO3TL-8U_qJuLPIVjfHj8bQFEBCvUSedf8u_DML6BXi-tyPqpq0HaGUt7WIcHZRDPW39lKhZpqpVbUw8inTneoBJWdS9lqsaGBFCW_BeTAHtXCuGAIHPImgZcvZaeZiyxcWqtrhIcextgOkDC6t7bgi9DnHvnAs",
    },
    SeedEntry {
        id: "ancillary-justice",
        title: "Ancillary Justice",
        author: "Ann Leckie",
        year: Some("2013"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuA-0oUDhnHX2JG1pSxY6qXu6G4hpSZ6uq1zVEBmNSs7HG7-2F9Mkz0E2UJqNWKG8hsPxNwfntL5qGg3h1G3_Y6Jk5YnUDeUHgRmI6V1GdokNU9O1h18CG64x5qqHGeHS_A4s_ceWsEGF1Q9BCvNPTC_XdaeC0F1g-r5wwHn0P8bAFXVZt7okIymjemzJc7o9nmro2nJb7flO5RnScaC0aO2ILJnl8Q1xkx3GDieJw_-1hALBN-oqIoc_DeTMYk3aobzHEc9ixatMJay",
    },
    SeedEntry {
        id: "gideon-ninth",
        title: "Gideon the Ninth",
        author: "Tamsyn Muir",
        year: Some("2019"),
        status: ReadingStatus::Read,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuC4mjqCB9sBkuyDcVOLZJjdz6l_IdHTquSQEM3ndFsiZ3Mpt2yR_RngEvHJydMfIwYR_EX1LZgS7lpvuoPhj6IC3VeLdLap1ixmBZv0rpdXuvjXb8W_kf2snF_V5KQy3kgbNRH7WjuR3t9VeQrqy-SbLiAyfdZ9jEGFbpXQLKKQ8kSn3AMEyft8RzLaEDjFlVXhMOTramlNq-JSpfWMv8-CWNDFSjZ-DDygxH5L-XIR7QAxe2gGh1wdo9XMK2KX5xgM24upZyZ6-50d",
    },
    SeedEntry {
        id: "time-war",
        title: "This Is How You Lose the Time War",
        author: "Amal El-Mohtar & Max Gladstone",
        year: Some("2019"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuCV-1ZVRwjQChR8P9AMgf9x9Tj3oKN_O-fyHuy5soTanJsc4XDSb78nQ02teCcicehzVlQg64dTPhEhx4sv4P6J6WL4BMuVxm0VC3ygj-F2uF60jICwwc5M3WUNf2pvfw_exj2JA0EncZ10pw44E45WZMssQFAIGsGypwg6Jth4JKXfMDDVcsvbiuwLsaN_GKQdpw3t98QnNyt4EnmhT0rp6mX6hUyR7RR04BcVAwCPOPF69nWLTzWO5HPI7lRGBZwCmBKU9JxAIJuw",
    },
    SeedEntry {
        id: "pride-prejudice",
        title: "Pride and Prejudice",
        author: "Jane Austen",
        year: Some("1813"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuAzCM1PUWsh3BssHvExN5vDNjuwMibVpHi9amtW6ZXKtWbkZ6PqaiXbgdXfNVzLMu12ohlxAGPjci_GLPlAz-O7Fkxv9WzbBXCtdS1zjIg5gH7WoDUEAFXV8xnccMi_pe66R-b6oB0GTWDb_mLwUjuDiUdu0GeMgTp2LFyGmLeOGkgx8irCuMW8Myw9kE_GzAhHAeqYMnwwx_6ajv-yEUwIxzq3t2AWSIY6J3MsSsd_5WSbd06JZItiBl5yfLMI5kbVkcryvs-g8MsA",
    },
    SeedEntry {
        id: "sense-sensibility",
        title: "Sense and Sensibility",
        author: "Jane Austen",
        year: Some("1811"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuBFDudqOMa-yAis8Mexb3CvrpFSskr5vrgCX5770YMgG5fX75JUHlPNRaulv5DuE95xReABLoTOkQVm6z9bXdbFh1vF_wkwcaF_l9HCmDUGJmMwkIUWV_9DM6RgJQNodu8EBSgbV2T8y0EtDqRma4LnzMaEMaQP1TJhSNDSx2oCuEUlLCfmPqC_3bJ7c-qg34LstT8eeshrGxH23xKDipli6SlvYBBKx8RFAn_FdN10nvvZaIdAIIgSlDB2lvsOV9HMGNRnq2H_raX-",
    },
    SeedEntry {
        id: "emma",
        title: "Emma",
        author: "Jane Austen",
        year: Some("1815"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuDEM4l37XcARvJ3U3ueymVFv_QuKSoAlpUuOQO_sP40i7mPqfJNDEDinwbzVjyo0ivLIwviOPJrDDstA3tgjkAuYujqdL66lkp43q8R6tL5RKxFUZoKZdz9-YqtZCzVQBvzUcWO7BvYTJ6jow-UJB9afAMmvLHswD73LXJOEZ1WZB8d-TlXrwc-NcYuqI7FjFV0Exb70h4qS8gpGI9vdgoqLTeRDG2SaK8PFOc8MeeuP6Mt-Odt9m_xwRMzOC1TZ1UJGf-llby0QUuu",
    },
    SeedEntry {
        id: "last-man",
        title: "The Last Man",
        author: "Mary Shelley",
        year: Some("1826"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuC13QwBVM5xF-CXD1MaX8qTmSwu7sgLRImXt4Gu-JqMdNz058xVDkXQt-3fNrYb-FF3-8NTPN5Fu9IFGIEjPCZoluRA1S3zx-rqi9W4POFYn3Qlb1XD8FOSeRlJiFP5shNpI38p1HFrATGurp5y6UhNTbNiWWpAT-wLpbavcMDls3Dy2gLiy0bKvEIz9zdV_MzwUS4tdZxM25jGOjsUFpTST-zD2GxL7pCP3_QKeR8Ljw04FWPoqIMml-X-hVMGppAJ_Cjjk_5lyvlk",
    },
    SeedEntry {
        id: "lodore",
        title: "Lodore",
        author: "Mary Shelley",
        year: Some("1835"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuAMpMsyVvMWDmHKYceCvSKfc6s7VY3qnkitgiWIHD4TrrFnt3Z1fRYSAkLAlWAbZPrj1vL7r0lUu00RRmBvie4iLPNUGaJGv3DkMkZNLff-CnpOLki3zLiudvF3KRrUsaAsqRq9NzGGJsIZp7pH1sCv-I1KYD8aOvt6CqlgVRCMhR2LDHJ-2mvW2NmCV_aoDH3jqAufoj52h_8ZkyJjsG9F728-s5hjac4_PxdDk5iYiDcC29DASkJA7IvFr1KieIxR3OlQpHp3-hK4",
    },
    SeedEntry {
        id: "falkner",
        title: "Falkner",
        author: "Mary Shelley",
        year: Some("1837"),
        status: ReadingStatus::ToRead,
        cover_url: "https://lh3.googleusercontent.com/aida-public/AB6AXuArtcEi0_e-wkrlvD3d5U2Jebva1nMuHT_bMvuxiD9Ktk1Qaw2LXFUmLXxfpCWA1sCxdsMFYGRkIwIYMyY2DSMhBAzBo2eHG09DLuhHr82S2xW4DvQRBoz85raZhhyLQ4Nm7yndiXwrzgVVUw0zs97nHN5L8QCtuSIrcssh5WxKmbctqgoP1aja-iLxVkG6r7vGkiVjz6XDIINmso_aRI_77zQfV-k6SiFJer1e9EdQV8h_pne9SEYtk65hMNJMC8kSItx5E3aiTdhH",
    },
    SeedEntry {
        id: "dune",
        title: "Dune",
        author: "Frank Herbert",
        year: Some("1965"),
        status: ReadingStatus::Read,
        cover_url: "https://picsum.photos/seed/dune/300/400",
    },
    SeedEntry {
        id: "earthsea",
        title: "A Wizard of Earthsea",
        author: "Ursula K. Le Guin",
        year: Some("1968"),
        status: ReadingStatus::Read,
        cover_url: "https://picsum.photos/seed/earthsea/300/400",
    },
    SeedEntry {
        id: "hail-mary",
        title: "Project Hail Mary",
        author: "Andy Weir",
        year: Some("2021"),
        status: ReadingStatus::Read,
        cover_url: "https://picsum.photos/seed/hailmary/300/400",
    },
];

/// Returns the seed catalog in its defined order.
pub fn seed_books() -> Vec<Book> {
    SEED_ENTRIES.iter().map(seed_book).collect()
}

/// Looks up one seed record by id.
pub fn find_seed_book(id: &str) -> Option<Book> {
    SEED_ENTRIES
        .iter()
        .find(|entry| entry.id == id)
        .map(seed_book)
}

/// Record shown when a requested id resolves to nothing: the first seed.
pub fn fallback_book() -> Book {
    seed_book(&SEED_ENTRIES[0])
}

fn seed_book(entry: &SeedEntry) -> Book {
    let mut book = Book::stub(entry.id, entry.title, entry.author);
    book.year = entry.year.map(str::to_string);
    book.status = entry.status;
    book.cover_url = entry.cover_url.to_string();

    if entry.id == "meditations" {
        book.category = Some("Philosophy".to_string());
        book.summary = Some(
            "A series of personal writings by Roman Emperor Marcus Aurelius, setting forth \
             his private notes to himself and ideas on Stoic philosophy. It offers a guide to \
             living a life of virtue, reason, and tranquility, even amidst chaos and adversity."
                .to_string(),
        );
        book.philosophy = Some(
            "The central philosophy revolves around finding peace by accepting what is outside \
             one's control and mastering one's own mind and reactions. True happiness comes \
             from living a virtuous life in accordance with nature and reason."
                .to_string(),
        );
        book.main_ideas = Some(vec![
            "Focus on what you can control; accept what you cannot.".to_string(),
            "Live in harmony with nature and your own rational mind.".to_string(),
            "Recognize the impermanence of all things to find perspective.".to_string(),
        ]);
    }

    book
}

/// Curated author collection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedAuthor {
    pub id: &'static str,
    pub name: &'static str,
    /// Life span such as `1775-1817`.
    pub years: &'static str,
    pub description: &'static str,
    pub books: Vec<Book>,
}

impl CuratedAuthor {
    /// First year of the life span, if parseable.
    pub fn start_year(&self) -> Option<u32> {
        self.years.split('-').next()?.trim().parse().ok()
    }
}

/// Curated authors with their seed books.
pub fn curated_authors() -> Vec<CuratedAuthor> {
    [
        (
            "jane-austen",
            "Jane Austen",
            "1775-1817",
            "For lovers of social commentary.",
        ),
        (
            "mary-shelley",
            "Mary Shelley",
            "1797-1851",
            "For its exploration of human ambition.",
        ),
    ]
    .into_iter()
    .map(|(id, name, years, description)| CuratedAuthor {
        id,
        name,
        years,
        description,
        books: seed_books()
            .into_iter()
            .filter(|book| book.author == name)
            .collect(),
    })
    .collect()
}

/// Splits curated authors into (golden age, others).
pub fn partition_golden_age(
    authors: Vec<CuratedAuthor>,
) -> (Vec<CuratedAuthor>, Vec<CuratedAuthor>) {
    authors.into_iter().partition(|author| {
        author
            .start_year()
            .is_some_and(|year| GOLDEN_AGE_YEARS.contains(&year))
    })
}

#[cfg(test)]
mod tests {
    use super::{
        curated_authors, fallback_book, find_seed_book, partition_golden_age, seed_books,
    };
    use std::collections::HashSet;

    #[test]
    fn seed_ids_are_unique_and_valid() {
        let books = seed_books();
        let ids = books.iter().map(|book| book.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), books.len());
        assert!(books.iter().all(|book| book.validate().is_ok()));
    }

    #[test]
    fn fallback_is_first_seed_entry() {
        assert_eq!(fallback_book(), seed_books()[0]);
        assert_eq!(fallback_book().id, "meditations");
    }

    #[test]
    fn find_seed_book_misses_unknown_ids() {
        assert!(find_seed_book("dune").is_some());
        assert!(find_seed_book("scanned-123").is_none());
    }

    #[test]
    fn seed_covers_are_fixed_remote_urls() {
        let books = seed_books();
        assert!(books.iter().all(|book| book.cover_url.starts_with("https://")));
        assert_eq!(
            find_seed_book("hail-mary").unwrap().cover_url,
            "https://picsum.photos/seed/hailmary/300/400"
        );
        assert!(find_seed_book("meditations")
            .unwrap()
            .cover_url
            .starts_with("https://lh3.googleusercontent.com/"));
    }

    #[test]
    fn curated_authors_pull_books_from_seed() {
        let authors = curated_authors();
        let austen = authors.iter().find(|a| a.id == "jane-austen").unwrap();
        assert_eq!(austen.books.len(), 3);
        assert_eq!(austen.start_year(), Some(1775));

        let (golden, others) = partition_golden_age(authors);
        assert_eq!(golden.len(), 2);
        assert!(others.is_empty());
    }
}
