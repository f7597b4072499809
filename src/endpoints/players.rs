use crate::error::{Result, ScrapeError};
use crate::models::{DataResponse, PlayerProfile};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::parse_date;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::info;

static INFO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div#info").expect("info selector"));
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1 span, span").expect("name selector"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").expect("strong selector"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").expect("p selector"));
static BIRTH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span#necro-birth[data-birth]").expect("birth selector"));
static BIRTH_PLACE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span[itemprop=\"birthPlace\"]").expect("birthplace selector"));
static WAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.important.poptip").expect("wages selector"));
static PHOTO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").expect("img selector"));

static POSITION_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{2}").expect("position pattern"));
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("iso date pattern"));
static PLACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)in\s+(.+)").expect("place pattern"));
static HEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)cm").expect("height pattern"));
static WEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)kg").expect("weight pattern"));
static PLACE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['\[\]",]"#).expect("noise pattern"));

/// Profile block of one player page.
pub async fn scrape(ctx: &ScrapeContext, player_id: &str) -> Result<DataResponse<PlayerProfile>> {
    let html = ctx.fetch_page(&format!("players/{}/", player_id)).await?;
    let profile = parse_profile(&html, player_id)?;
    info!("Player {}: {:?}", player_id, profile.full_name);
    Ok(DataResponse::new(profile))
}

fn parse_profile(html: &str, player_id: &str) -> Result<PlayerProfile> {
    let doc = Html::parse_document(html);
    let info = doc
        .select(&INFO)
        .next()
        .ok_or_else(|| ScrapeError::NotFound(format!("player {}", player_id)))?;

    let (birth_city, birth_country) = birthplace(info).unwrap_or_default();
    let (height, weight) = height_weight(info);

    Ok(PlayerProfile {
        player_id: player_id.to_string(),
        full_name: info.select(&NAME).next().map(text).filter(|n| !n.is_empty()),
        positions: after_label(info, "Position:")
            .map(|s| POSITION_CODE.find_iter(&s).map(|m| m.as_str().to_string()).collect()),
        footed: after_label(info, "Footed:").map(|s| s.trim().to_string()),
        date_of_birth: date_of_birth(info),
        birth_city,
        nationality: nationality(info),
        wages: wages(info),
        height,
        photo_url: info
            .select(&PHOTO)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string),
        birth_country,
        weight,
    })
}

fn text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn label<'a>(info: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    info.select(&STRONG).find(|s| text(*s) == name)
}

/// The text node directly following a `<strong>` label.
fn after_label(info: ElementRef, name: &str) -> Option<String> {
    label(info, name)?
        .next_siblings()
        .find_map(|node| node.value().as_text().map(|t| String::from(&**t)))
}

/// The first link following a `<strong>` label.
fn link_after_label(info: ElementRef, name: &str) -> Option<String> {
    label(info, name)?
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .map(text)
}

fn date_of_birth(info: ElementRef) -> Option<String> {
    label(info, "Born:")?;
    let raw = match info.select(&BIRTH).next() {
        Some(span) => span.value().attr("data-birth").map(str::to_string),
        None => label(info, "Born:")?
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "span")
            .map(text),
    }?;
    if ISO_DATE.is_match(&raw) {
        Some(raw)
    } else {
        parse_date(&raw.replace('\n', " "))
    }
}

/// `(city, country)` from "in Rosario, Argentina". A lone place is taken as
/// the country; a city equal to its country is dropped.
fn birthplace(info: ElementRef) -> Option<(Option<String>, Option<String>)> {
    label(info, "Born:")?;
    let span = info.select(&BIRTH_PLACE).next().or_else(|| {
        info.select(&BIRTH)
            .next()?
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "span")
    })?;
    let raw = span.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ");
    let place = PLACE.captures(&raw)?.get(1)?.as_str().to_string();

    let parts: Vec<&str> = place.split(',').collect();
    let (last, rest) = parts.split_last()?;
    let country = clean_place(last);
    let city = rest.first().map(|c| clean_place(&c.replace('-', " ")));
    let city = city.filter(|c| !c.is_empty() && *c != country);
    Some((city, Some(country).filter(|c| !c.is_empty())))
}

fn clean_place(s: &str) -> String {
    let s = PLACE_NOISE.replace_all(s, "");
    s.trim().trim_start_matches("in ").trim().to_string()
}

/// Senior team, then youth team, then citizenship.
fn nationality(info: ElementRef) -> Option<String> {
    ["National Team:", "Youth National Team:", "Citizenship:"]
        .into_iter()
        .find_map(|name| link_after_label(info, name))
}

fn wages(info: ElementRef) -> Option<String> {
    label(info, "Wages")?;
    let raw = text(info.select(&WAGES).next()?);
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '£' | '$' | '€' | ',')).collect();
    Some(cleaned.trim().to_string())
}

fn height_weight(info: ElementRef) -> (Option<f64>, Option<f64>) {
    let Some(line) = info.select(&PARAGRAPH).map(text).find(|p| HEIGHT.is_match(p)) else {
        return (None, None);
    };
    let number = |re: &Regex| re.captures(&line).and_then(|c| c[1].parse::<f64>().ok());
    (number(&HEIGHT), number(&WEIGHT))
}
