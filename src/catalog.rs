//! Category label catalog and static keyword tables.
//!
//! Pure data consumed by the classifier and the image resolver. The tables
//! are Marathi (Devanagari) keyword lists keyed by short ASCII category
//! keys; display labels are used by the output layer when rendering feeds.

/// Category assigned when no keyword table matches.
pub const GENERAL_CATEGORY: &str = "general";

/// Language tag stored on every ingested article.
pub const DEFAULT_LANGUAGE: &str = "mr";

/// Geographic categories, matched against the title plus the leading
/// description snippet (city names are unambiguous in running text).
pub const LOCATION_CATEGORIES: &[&str] = &[
    "pune", "mumbai", "nashik", "ahmednagar", "aurangabad", "maharastra",
];

/// Topical categories, matched against the title only.
pub const TOPIC_CATEGORIES: &[&str] = &[
    "desh", "videsh", "political", "sports", "entertainment", "tourism", "lifestyle",
    "agriculture", "government", "trade", "health", "horoscope",
];

/// Keywords that mark an item as on-topic for the strict ingest path.
pub const ALLOWED_KEYWORDS: &[&str] = &[
    "सरकार", "राज्य", "महापालिका",
    "पालिका", "प्रशासन", "मंत्री", "आमदार",
    "खासदार", "निवडणूक", "विकास", "योजना",
    "सभा", "निर्णय",
];

/// An item is blocked only when two or more distinct entries occur; a
/// single mention of a sensitive topic is legitimate coverage.
pub const BLOCKED_KEYWORDS: &[&str] = &[
    "खून", "हत्या", "आत्महत्या", "अपघात",
    "बलात्कार", "गोळीबार", "चाकू",
    "गुन्हा",
];

/// Keyword table for one category key.
pub fn keywords_for(category: &str) -> &'static [&'static str] {
    match category {
        "desh" => &[
            "देश", "भारत", "राष्ट्रीय",
            "केंद्र", "दिल्ली", "संसद",
            "राष्ट्रपती", "प्रधानमंत्री",
            "सर्वोच्च न्यायालय", "सीबीआय",
            "एनआयए",
        ],
        "videsh" => &[
            "विदेश", "परदेश",
            "आंतरराष्ट्रीय", "जागतिक",
            "अमेरिका", "चीन", "पाकिस्तान",
            "रशिया", "युक्रेन", "ब्रिटन",
            "संयुक्त राष्ट्र", "नाटो",
            "युरोप",
        ],
        "maharastra" => &[
            "महाराष्ट्र", "मराठवाडा", "कोकण",
            "विदर्भ", "खानदेश",
            "पश्चिम महाराष्ट्र",
            "राज्य सरकार",
        ],
        "pune" => &[
            "पुणे", "पुण्यात", "पुण्याचा",
            "पुण्यातील", "पिंपरी", "चिंचवड",
            "हडपसर", "कोथरूड",
        ],
        "mumbai" => &[
            "मुंबई", "मुंबईत", "मुंबईचा",
            "मुंबईतील", "बॉम्बे", "ठाणे",
            "नवी मुंबई", "वसई", "विरार",
            "अंधेरी", "दादर", "बोरीवली",
        ],
        "nashik" => &[
            "नाशिक", "नाशिकात", "नाशिकचा",
            "नाशिकतील", "त्र्यंबकेश्वर",
            "सिन्नर", "मालेगाव",
        ],
        "ahmednagar" => &[
            "अहमदनगर", "अहिल्यानगर", "नगर",
            "श्रीरामपूर", "शिर्डी",
        ],
        "aurangabad" => &[
            "औरंगाबाद", "संभाजीनगर",
            "छत्रपती संभाजीनगर", "जालना",
            "बीड",
        ],
        "political" => &[
            "राजकारण", "राजकीय", "आमदार",
            "खासदार", "मंत्री",
            "मुख्यमंत्री", "पक्ष", "निवडणूक",
            "भाजप", "काँग्रेस", "शिवसेना",
            "राष्ट्रवादी", "विरोधक",
            "सत्ताधारी", "विधानसभा",
            "लोकसभा", "राज्यसभा", "पवार",
            "ठाकरे", "फडणवीस", "शिंदे", "राऊत",
            "उपमुख्यमंत्री", "विधानपरिषद",
            "महायुती", "मविआ",
        ],
        "sports" => &[
            "क्रीडा", "खेळ", "स्पोर्ट्स",
            "क्रिकेट", "फुटबॉल", "टेनिस",
            "खेळाडू", "आयपीएल", "विश्वचषक",
            "ऑलिम्पिक", "कबड्डी", "हॉकी",
            "बॅडमिंटन", "विराट", "रोहित",
            "धोनी", "बीसीसीआय", "सामना",
            "स्पर्धा",
        ],
        "entertainment" => &[
            "मनोरंजन", "चित्रपट", "फिल्म",
            "सिनेमा", "अभिनेता", "अभिनेत्री",
            "सिरीयल", "गाणे", "बॉलिवूड",
            "मराठी चित्रपट", "नाटक",
            "वेब सिरीज", "ओटीटी", "बिग बॉस",
        ],
        "tourism" => &[
            "पर्यटन", "पर्यटक", "टूर", "यात्रा",
            "सफर", "ठिकाण", "दर्शन",
            "हिल स्टेशन", "समुद्रकिनारा",
            "किल्ला", "लेणी", "मंदिर",
            "धार्मिक स्थळ",
        ],
        "lifestyle" => &[
            "जीवनशैली", "फॅशन", "स्टाईल",
            "सौंदर्य", "ब्यूटी", "फिटनेस",
            "योगा", "डाएट", "वेलनेस",
            "स्किनकेअर", "रेसिपी",
            "स्वयंपाक",
        ],
        "agriculture" => &[
            "शेती", "शेतकरी", "पिक", "धान्य",
            "कृषी", "खते", "सिंचन", "कापूस",
            "सोयाबीन", "ऊस", "कांदा", "हमीभाव",
            "मंडी", "बाजारभाव",
        ],
        "government" => &[
            "सरकार", "सरकारी", "प्रशासन",
            "पालिका", "महापालिका", "योजना",
            "निर्णय", "जिल्हाधिकारी",
            "आयुक्त", "अर्थसंकल्प", "कर",
            "जीएसटी",
        ],
        "trade" => &[
            "व्यापार", "व्यवसाय", "बाजार",
            "कंपनी", "उद्योग", "व्यापारी",
            "शेअर", "सेन्सेक्स", "निफ्टी",
            "गुंतवणूक", "स्टार्टअप",
            "निर्यात", "आयात",
        ],
        "health" => &[
            "आरोग्य", "रुग्णालय", "डॉक्टर",
            "औषध", "उपचार", "रोग", "आजार", "लस",
            "कोरोना", "कॅन्सर", "मधुमेह",
            "हृदयविकार", "शस्त्रक्रिया",
            "एम्स",
        ],
        "horoscope" => &[
            "भविष्य", "राशी", "ज्योतिष",
            "राशिभविष्य", "कुंडली",
            "ग्रहस्थिती", "पंचांग", "मेष",
            "वृषभ", "मिथुन", "कर्क", "सिंह",
            "कन्या", "तूळ", "वृश्चिक", "धनु",
            "मकर", "कुंभ", "मीन",
        ],
        _ => &[],
    }
}

/// Display metadata for a category key.
#[derive(Debug, Clone, Copy)]
pub struct CategoryLabel {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const CATEGORY_LABELS: &[CategoryLabel] = &[
    CategoryLabel {
        key: "desh",
        title: "देश बातम्या",
        description: "भारतातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "videsh",
        title: "विदेश बातम्या",
        description: "आंतरराष्ट्रीय ताज्या बातम्या",
    },
    CategoryLabel {
        key: "maharastra",
        title: "महाराष्ट्र बातम्या",
        description: "महाराष्ट्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "pune",
        title: "पुणे बातम्या",
        description: "पुण्यातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "mumbai",
        title: "मुंबई बातम्या",
        description: "मुंबईतील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "nashik",
        title: "नाशिक बातम्या",
        description: "नाशिकातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "ahmednagar",
        title: "अहमदनगर बातम्या",
        description: "अहमदनगरातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "aurangabad",
        title: "संभाजीनगर बातम्या",
        description: "संभाजीनगरातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "political",
        title: "राजकारण बातम्या",
        description: "राजकीय ताज्या बातम्या",
    },
    CategoryLabel {
        key: "sports",
        title: "क्रीडा बातम्या",
        description: "खेळाच्या ताज्या बातम्या",
    },
    CategoryLabel {
        key: "entertainment",
        title: "मनोरंजन बातम्या",
        description: "मनोरंजन क्षेत्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "tourism",
        title: "पर्यटन बातम्या",
        description: "पर्यटन क्षेत्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "lifestyle",
        title: "जीवनशैली",
        description: "जीवनशैलीशी संबंधित ताज्या बातम्या",
    },
    CategoryLabel {
        key: "agriculture",
        title: "कृषी बातम्या",
        description: "शेती आणि कृषी क्षेत्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "government",
        title: "सरकारी बातम्या",
        description: "सरकारी निर्णय आणि योजनांच्या बातम्या",
    },
    CategoryLabel {
        key: "trade",
        title: "व्यापार बातम्या",
        description: "व्यापार आणि उद्योग क्षेत्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "health",
        title: "आरोग्य बातम्या",
        description: "आरोग्य क्षेत्रातील ताज्या बातम्या",
    },
    CategoryLabel {
        key: "horoscope",
        title: "राशिभविष्य",
        description: "आजचे राशिभविष्य",
    },
    CategoryLabel {
        key: "general",
        title: "ताज्या बातम्या",
        description: "सर्व ताज्या मराठी बातम्या",
    },
];

/// Label lookup, falling back to the general label for unknown keys.
pub fn label_for(key: &str) -> &'static CategoryLabel {
    // The general label is the final table entry.
    let general = &CATEGORY_LABELS[CATEGORY_LABELS.len() - 1];
    CATEGORY_LABELS
        .iter()
        .find(|l| l.key == key)
        .unwrap_or(general)
}

/// Stock-photo search term for a category key.
pub fn stock_search_term(category: &str) -> &'static str {
    match category {
        "desh" => "india news delhi",
        "videsh" => "world news globe",
        "maharastra" => "maharashtra india landscape",
        "pune" => "pune city india",
        "mumbai" => "mumbai skyline india",
        "nashik" => "nashik india temple",
        "ahmednagar" => "indian city",
        "aurangabad" => "aurangabad india fort",
        "political" => "indian parliament politics",
        "sports" => "cricket sports stadium",
        "entertainment" => "bollywood cinema film",
        "tourism" => "india travel landscape",
        "lifestyle" => "lifestyle wellness modern",
        "agriculture" => "farming agriculture india field",
        "government" => "government building india",
        "trade" => "business market stock",
        "health" => "health medical hospital",
        "horoscope" => "astrology zodiac stars",
        _ => "india news newspaper",
    }
}
