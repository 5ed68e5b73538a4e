use nom::bytes::complete::{tag, take_till1, take_until, take_while1};
use nom::character::complete::char;
use nom::combinator::{map, verify};
use nom::multi::many1;
use nom::sequence::delimited;
use nom::IResult;
use nom::branch::alt;

#[derive(PartialEq, Eq, Debug, Clone)]
pub(in crate::dictionary) struct CandidatePrototype<'a> {
    pub(in crate::dictionary) kouho: &'a str,
    pub(in crate::dictionary) annotation: Option<&'a str>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub(in crate::dictionary) struct DictEntryPrototype<'a> {
    pub(in crate::dictionary) midasi: &'a str,
    pub(in crate::dictionary) candidates: Vec<CandidatePrototype<'a>>,
}

/// 辞書のエントリを読む
/// "かんがe /考/勘/[え/考/]/" の厳密な送り仮名のブロックは読み飛ばす。
pub(in crate::dictionary) fn entry(input: &str) -> IResult<&str, DictEntryPrototype> {
    let (i, midasi) = midasi(input)?;
    let (i, _) = take_while1(|c| c == ' ')(i)?;
    let (i, candidates) = candidates(i)?;

    Ok((i, DictEntryPrototype { midasi, candidates }))
}

fn midasi(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == ' ')(input)
}

/// '/'で始まり'/'で終わる候補リスト全体
fn candidates(input: &str) -> IResult<&str, Vec<CandidatePrototype>> {
    let (i, parsed) = many1(candidate)(input)?;
    // Make sure ends with '/'
    let (i, _) = char('/')(i)?;

    Ok((i, parsed.into_iter().flatten().collect()))
}

/// 最初の'/'で囲われた部分。厳密な送り仮名のブロックはNone。
fn candidate(input: &str) -> IResult<&str, Option<CandidatePrototype>> {
    alt((
        map(strict_okuri_block, |_| None),
        map(non_strict_okuri_candidate, Some),
    ))(input)
}

fn strict_okuri_block(input: &str) -> IResult<&str, &str> {
    delimited(tag("/["), take_until("]"), char(']'))(input)
}

/// 次の'/'直前までの候補。';'以降はannotation。
fn non_strict_okuri_candidate(input: &str) -> IResult<&str, CandidatePrototype> {
    let (i, _) = char('/')(input)?;
    let (i, cand) = verify(take_till1(|c: char| c == '/'), |s: &str| {
        !contains_illegal_char(s)
    })(i)?;
    match cand.split_once(';') {
        Some((kouho, annotation)) if !kouho.is_empty() => Ok((
            i,
            CandidatePrototype {
                kouho,
                annotation: Some(annotation),
            },
        )),
        _ => Ok((
            i,
            CandidatePrototype {
                kouho: cand,
                annotation: None,
            },
        )),
    }
}

fn contains_illegal_char(s: &str) -> bool {
    s.contains('[') || s.contains(']')
}
