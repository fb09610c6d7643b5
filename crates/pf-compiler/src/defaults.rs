//! Built-in policy lists
//!
//! Empirically tuned data used when a configuration does not override it.
//! Nothing in the compiler attaches meaning to individual entries.

/// Options whose scoping the matcher cannot honor; a rule carrying one is
/// dropped.
pub const IGNORED_OPTIONS: &[&str] = &[
    "domain",
    "script",
    "stylesheet",
    "object",
    "xmlhttprequest",
    "subdocument",
    "ping",
    "websocket",
    "webrtc",
    "document",
    "elemhide",
    "genericblock",
    "other",
    "sitekey",
    "match-case",
    "collapse",
    "donottrack",
    "media",
    "font",
];

/// Options that admit a bad rule past the content filter.
pub const HIGH_VALUE_OPTIONS: &[&str] = &["third-party", "image", "popup", "object-subrequest"];

/// Keywords that raise a rule's rank. Also part of the content filter.
pub const RANKING_KEYWORDS: &[&str] = &[
    r"trac?k",
    r"beacon",
    r"stat[is]?",
    r"anal[iy]",
    r"goog",
    r"facebook",
    r"yahoo",
    r"amazon",
    r"adob",
    r"msn",
    r"goog\S+?ad",
    r"amazon\S+?ad",
    r"yahoo\S+?ad",
    r"facebook\S+?ad",
    r"adob\S+?ad",
    r"msn\S+ad",
    r"doubleclick",
    r"cooki",
    r"twitter",
    r"krxd",
    r"pagead",
    r"syndicat",
    r"(?:\bad|ad\b)",
    r"securepub",
    r"static",
    r"\boas\b",
    r"ads",
    r"cdn",
    r"cloud",
    r"banner",
    r"financ",
    r"share",
    r"traffic",
    r"creativ",
    r"media",
    r"host",
    r"affil",
    r"^mob",
    r"data",
    r"your?",
    r"watch",
    r"survey",
    r"stealth",
    r"invisible",
    r"brand",
    r"site",
    r"merch",
    r"kli[kp]",
    r"clic?k",
    r"popup",
    r"log",
    r"assets",
    r"count",
    r"metric",
    r"score",
    r"event",
    r"tool",
    r"quant",
    r"chart",
    r"opti?m",
    r"partner",
    r"sponsor",
    r"affiliate",
];

/// Content filter keywords beyond [`RANKING_KEYWORDS`].
const CONTENT_KEYWORD_EXTRAS: &[&str] = &[
    r"image",
    r"img",
    r"pop",
    r"game",
    r"free",
    r"film",
    r"fast",
    r"farmville",
    r"fan",
    r"exp",
    r"cash",
    r"money",
    r"dollar",
    r"buck",
    r"dump",
    r"deal",
    r"daily",
    r"content",
    r"kick",
    r"down",
    r"file",
    r"video",
    r"match",
    r"ifram",
    r"cam",
    r"widget",
    r"monk",
    r"rapid",
    r"platform",
    r"google",
    r"follow",
    r"shop",
    r"love",
    r"smile",
    r"happy",
    r"dash",
    r"board",
    r"tube",
    r"torrent",
    r"\.(biz|ru|tv|stream|cricket|online|racing|party|trade|webcam|science|win|accountant|loan|faith|date)",
    r"join",
    r"social",
    r"script",
    r"xchang",
    r"zip",
    r"invest",
    r"arstech",
    r"buzzfeed",
    r"imdb",
    r"baidu",
    r"yandex",
    r"youtube",
    r"ebay",
    r"discovercard",
    r"chase",
    r"hsbc",
    r"usbank",
    r"santander",
    r"kaspersky",
    r"symantec",
    r"brightcove",
    r"hidden",
    r"macromedia",
    r"flash",
    r"[^i]scan[^dy]",
    r"secret",
    r"skype",
    r"tsbbank",
    r"tunnel",
    r"ubs\.com",
    r"unblock",
    r"unlock",
    r"usaa\.com",
    r"ustreas\.gov",
    r"ustreasury",
    r"verifiedbyvisa\.com",
    r"viagra",
    r"wachovia",
    r"wellsfargo\.com",
    r"westernunion",
    r"windowsupdate",
    r"plugin",
    r"nielsen",
    r"oas-config",
    r"oas/oas",
    r"pix",
    r"visit",
    r"voxmedia\.com",
    r"w3track\.com",
    r"web_?ad",
    r"webiq",
    r"weblog",
    r"webtrek",
    r"webtrend",
    r"wget\.exe",
    r"winstart\.(exe|zip)",
    r"wired\.com",
    r"ad-limits\.js",
    r"ad-manager",
    r"ad_engine",
    r"adx\.js",
    r"\.bat",
    r"\.bin",
    r"[^ck]anal[^_]",
    r"\.com/[ap]\.gif",
    r"\.com\.au/ads",
    r"\.cpl",
    r"[^bhmz]eros",
    r"\.exe",
    r"\.msi",
    r"\.net/p\.gif",
    r"\.pac",
    r"\.pdf",
    r"\.rar",
    r"\.scr",
    r"\.sh",
    r"transparent1x1\.gif",
    r"/travidia",
    r"__utm\.js",
    r"whv2_001\.js",
    r"xtcore\.js",
    r"\.zip",
    r"stats\.wp\.com",
    r"[^i]crack",
    r"virgins\.com",
    r"\.xyz",
    r"shareasale\.com",
    r"financialcontent\.com",
];

/// Wildcard rules matching these are admitted to the wildcard budget first,
/// most significant first.
pub const WILDCARD_PREFERENCES: &[&str] = &[r"track", r"beacon", r"stat[is]", r"anal[iy]"];

/// Comment markers that open a commented-out section of a rule source.
pub const IGNORED_SECTIONS: &[&str] = &[
    "gizmodo.in",
    "shink.in",
    "project-free-tv.li",
    "vshare.eu",
    "pencurimovie.ph",
    "filmlinks4u.is",
    "Spiegel.de",
    "bento.de",
    "German",
    "French",
    "Arabic",
    "Armenian",
    "Belarusian",
    "Bulgarian",
    "Chinese",
    "Croatian",
    "Czech",
    "Danish",
    "Dutch",
    "Estonian",
    "Finnish",
    "Georgian",
    "Greek",
    "Hebrew",
    "Hungarian",
    "Icelandic",
    "Indian",
    "Indonesian",
    "Italian",
    "Japanese",
    "Korean",
    "Latvian",
    "Lithuanian",
    "Norwegian",
    "Persian",
    "Polish",
    "Portuguese",
    "Romanian",
    "Russian",
    "Serbian",
    "Singaporean",
    "Slovene",
    "Slovak",
    "Spanish",
    "Swedish",
    "Thai",
    "Turkish",
    "Ukranian",
    "Ukrainian",
    "Vietnamese",
    "Gamestar.de",
    "Focus.de",
    "tvspielfilm.de",
    "Prosieben",
    "Wetter.com",
    "Woxikon.de",
    "Fanfiktion.de",
    "boote-forum.de",
    "comunio.de",
    "planetsnow.de",
];

/// File-extension path terminators (regex alternatives, matched
/// case-insensitively after a `.` at the end of the path).
pub const PATH_EXTENSIONS: &[&str] = &[
    r"jsp?",
    r"php",
    r"xml",
    r"jpe?g",
    r"png",
    r"p?gif",
    r"img",
    r"swf",
    r"flv",
    r"[sp]?html?",
    r"f?cgi",
    r"pl?",
    r"aspx",
    r"ashx",
    r"css",
    r"jsonp?",
    r"asp",
    r"search",
    r"cfm",
    r"ico",
    r"act(?:ion)?",
    r"spy",
    r"do",
    r"stm",
    r"cms",
    r"txt",
    r"imu",
    r"dll",
    r"io",
    r"smjs",
    r"xhr",
    r"ount",
    r"bin",
    r"py",
    r"dyn",
    r"gne",
    r"mvc",
    r"lv",
    r"nap",
    r"jam",
    r"nhn",
];

/// Hosts that are always blocked, even when a good rule covers them.
pub const GOOD_DOMAIN_EXCEPTIONS: &[&str] = &[
    "iad.apple.com",
    "iadsdk.apple.com",
    "iadsdk.apple.com.edgekey.net",
    "bingads.microsoft.com",
    "azure.bingads.trafficmanager.net",
    "choice.microsoft.com",
    "choice.microsoft.com.nsatc.net",
    "corpext.msitadfs.glbdns2.microsoft.com",
    "corp.sts.microsoft.com",
    "df.telemetry.microsoft.com",
    "diagnostics.support.microsoft.com",
    "feedback.search.microsoft.com",
    "i1.services.social.microsoft.com",
    "i1.services.social.microsoft.com.nsatc.net",
    "redir.metaservices.microsoft.com",
    "reports.wes.df.telemetry.microsoft.com",
    "services.wes.df.telemetry.microsoft.com",
    "settings-sandbox.data.microsoft.com",
    "settings-win.data.microsoft.com",
    "sqm.df.telemetry.microsoft.com",
    "sqm.telemetry.microsoft.com",
    "sqm.telemetry.microsoft.com.nsatc.net",
    "statsfe1.ws.microsoft.com",
    "statsfe2.update.microsoft.com.akadns.net",
    "statsfe2.ws.microsoft.com",
    "survey.watson.microsoft.com",
    "telecommand.telemetry.microsoft.com",
    "telecommand.telemetry.microsoft.com.nsatc.net",
    "telemetry.urs.microsoft.com",
    "vortex.data.microsoft.com",
    "vortex-sandbox.data.microsoft.com",
    "vortex-win.data.microsoft.com",
    "cy2.vortex.data.microsoft.com.akadns.net",
    "watson.microsoft.com",
    "watson.ppe.telemetry.microsoft.com",
    "watson.telemetry.microsoft.com",
    "watson.telemetry.microsoft.com.nsatc.net",
    "wes.df.telemetry.microsoft.com",
    "win10.ipv6.microsoft.com",
    "www.bingads.microsoft.com",
];

/// Bad rules kept whatever their rank.
pub const PINNED_RULES: &[&str] = &["/securepubads.", "||google.com/pagead"];

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Full content filter keyword list.
pub fn content_keywords() -> Vec<String> {
    RANKING_KEYWORDS
        .iter()
        .chain(CONTENT_KEYWORD_EXTRAS)
        .map(|s| s.to_string())
        .collect()
}
