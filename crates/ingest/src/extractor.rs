//! 로그 라인 쿼리 추출기
//!
//! 액세스 로그 한 줄에서 설정된 검색 핸들러로 향한 요청의 `q` 파라미터를
//! 찾아 디코딩합니다.
//!
//! # 매칭 규칙
//! ```text
//! ... GET {handler_path}?q={urlencoded}[&...| ...] ...
//!                          ^^^^^^^^^^^^ 다음 '&' 또는 공백 직전까지 캡처
//! ```
//!
//! - 한 줄에 여러 번 나타나면 첫 번째(가장 왼쪽) 매치만 사용
//! - `q=` 뒤가 비어 있으면 빈 쿼리로 취급 (걸러내지 않음)
//! - 매칭은 바이트 단위로 수행하므로 라인의 다른 부분이 UTF-8이 아니어도
//!   상관없음. UTF-8 검사는 캡처된 값에만 적용
//!
//! # 사용 예시
//! ```
//! use querytally_ingest::LineExtractor;
//!
//! let extractor = LineExtractor::new("/solr/core1/browse").unwrap();
//! let line = r#"10.0.0.1 - - [12/Mar/2012:10:00:00 +0000] "GET /solr/core1/browse?q=red+shoes&foo=bar HTTP/1.1" 200 512"#;
//! assert_eq!(extractor.extract(line).unwrap().as_deref(), Some("red shoes"));
//! ```

use std::borrow::Cow;

use regex::bytes::Regex;

use querytally_core::error::DecodeError;

use crate::error::IngestError;

/// 핸들러 경로에 묶인 쿼리 추출기
///
/// 패턴은 생성 시 한 번만 컴파일되어 모든 라인에 재사용됩니다.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    handler_path: String,
    pattern: Regex,
}

impl LineExtractor {
    /// 핸들러 경로로 추출기를 생성합니다.
    ///
    /// 경로에 포함된 정규식 메타문자는 문자 그대로 매칭됩니다.
    pub fn new(handler_path: &str) -> Result<Self, IngestError> {
        let pattern = Regex::new(&format!(
            r"GET {}\?q=((?-u:[^& ])*)",
            regex::escape(handler_path)
        ))
        .map_err(|source| IngestError::Pattern {
            handler_path: handler_path.to_owned(),
            source,
        })?;

        Ok(Self {
            handler_path: handler_path.to_owned(),
            pattern,
        })
    }

    /// 추출 대상 핸들러 경로
    pub fn handler_path(&self) -> &str {
        &self.handler_path
    }

    /// 한 줄에서 디코딩된 쿼리를 추출합니다.
    ///
    /// 매치가 없으면 `Ok(None)`, 캡처가 잘못 인코딩되어 있으면 [`DecodeError`]입니다.
    pub fn extract(&self, line: &str) -> Result<Option<String>, DecodeError> {
        self.extract_bytes(line.as_bytes())
    }

    /// 인코딩을 알 수 없는 원시 라인에서 쿼리를 추출합니다.
    ///
    /// 캡처된 값이 UTF-8이 아니면 [`DecodeError::InvalidUtf8`]입니다.
    pub fn extract_bytes(&self, line: &[u8]) -> Result<Option<String>, DecodeError> {
        let Some(captures) = self.pattern.captures(line) else {
            return Ok(None);
        };
        let raw = captures.get(1).map_or(&b""[..], |m| m.as_bytes());
        let raw = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8 {
            raw: String::from_utf8_lossy(raw).into_owned(),
        })?;
        decode_query(raw).map(Some)
    }
}

/// `application/x-www-form-urlencoded` 규칙으로 쿼리 값을 디코딩합니다.
///
/// - `+`는 공백으로 바뀝니다.
/// - `%XX`는 바이트로 디코딩되며, 결과 바이트열은 UTF-8이어야 합니다.
/// - `%` 뒤에 16진수 두 자리가 없으면 에러입니다 (부분 복구 없음).
pub fn decode_query(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    for (offset, _) in raw.match_indices('%') {
        let well_formed = bytes
            .get(offset + 1..offset + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(DecodeError::MalformedEscape {
                raw: raw.to_owned(),
                offset,
            });
        }
    }

    // '%2B'는 디코딩 전까지 인코딩된 채로 남으므로 먼저 치환해도 안전
    let plus_as_space = raw.replace('+', " ");
    urlencoding::decode(&plus_as_space)
        .map(Cow::into_owned)
        .map_err(|_| DecodeError::InvalidUtf8 {
            raw: raw.to_owned(),
        })
}
