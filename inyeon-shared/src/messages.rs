/// Localized user-facing messages
///
/// Every message shown to a user lives here so the API, the client and the
/// validation schemas agree on wording. Messages are Korean, matching the
/// product's only supported locale.

// Validation: sign-up / sign-in
pub const EMAIL_REQUIRED: &str = "이메일을 입력해주세요.";
pub const EMAIL_INVALID: &str = "올바른 이메일 형식을 입력해주세요.";
pub const PASSWORD_REQUIRED: &str = "비밀번호를 입력해주세요.";
pub const PASSWORD_SPECIAL_CHAR: &str = "하나 이상의 특수문자가 포함되어야 합니다.";
pub const PASSWORD_MIN_LENGTH: &str = "8자 이상으로 입력해주세요.";
pub const PASSWORD_CHECK_REQUIRED: &str = "비밀번호를 다시 입력해주세요.";
pub const PASSWORD_MISMATCH: &str = "비밀번호가 일치하지 않습니다.";
pub const NICKNAME_REQUIRED: &str = "닉네임을 입력해주세요.";
pub const NICKNAME_MIN_LENGTH: &str = "2자 이상으로 입력해주세요.";
pub const NICKNAME_MAX_LENGTH: &str = "8자 이하로 입력해주세요.";
pub const NICKNAME_CHARSET: &str = "띄어쓰기를 제외한 특수문자를 사용할 수 없습니다.";

/// Fallback for a form rejected without per-field messages
pub const CHECK_INPUT: &str = "입력한 내용을 다시 확인해주세요.";

// Validation: contact form
pub const CONTACT_NAME_REQUIRED: &str = "이름을 입력해주세요.";
pub const CONTACT_NOTES_MIN_LENGTH: &str = "최소 5자 이상 입력해주세요.";
pub const CONTACT_PHONE_INVALID: &str = "숫자만 입력해주세요.";
pub const CONTACT_EMAIL_INVALID: &str = "유효한 이메일 주소를 입력해주세요.";
pub const CONTACT_BIRTH_INVALID: &str = "생일은 YYYY-MM-DD 형식으로 입력해주세요.";

// Validation: plan form
pub const PLAN_TITLE_REQUIRED: &str = "제목을 입력해주세요.";
pub const PLAN_CONTACT_REQUIRED: &str = "내사람을 선택해주세요";
pub const PLAN_START_REQUIRED: &str = "시작 날짜를 선택해주세요.";

// Auth flow
pub const DUPLICATE_CHECK_REQUIRED: &str = "이메일과 닉네임 중복 검사를 완료해주세요.";
pub const DUPLICATE_EMAIL: &str = "중복된 이메일이 존재합니다.";
pub const DUPLICATE_NICKNAME: &str = "중복된 닉네임이 존재합니다.";
pub const EMAIL_AVAILABLE: &str = "사용가능한 이메일입니다.";
pub const NICKNAME_AVAILABLE: &str = "사용가능한 닉네임입니다.";
pub const CHECK_EMAIL_FORMAT: &str = "이메일 형식을 확인해주세요.";
pub const CHECK_NICKNAME_FORMAT: &str = "닉네임 형식을 확인해주세요.";
pub const SIGN_UP_REJECTED: &str = "입력한 정보를 다시 한 번 확인해주세요.";
pub const SIGN_UP_COMPLETE: &str =
    "회원가입이 완료되었습니다. 자동으로 로그인되어 '내 사람' 페이지로 이동합니다.";
pub const INVALID_CREDENTIALS: &str = "아이디 또는 비밀번호를 확인해주세요.";
pub const NOT_SIGNED_IN: &str = "로그인된 사용자가 없습니다. 다시 시도해주세요.";
pub const SESSION_EXPIRED: &str = "로그인이 만료되었습니다. 다시 로그인해주세요.";

// Demo mode
pub const DEMO_RESTRICTED: &str = "데모체험중에는 제한된 기능입니다.";

// Service operations
pub const FETCH_CONTACTS_FAILED: &str = "연락처를 불러오는 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const FETCH_CONTACT_DETAIL_FAILED: &str =
    "연락처 정보를 가져오는 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const FETCH_PINNED_FAILED: &str = "고정된 사람을 불러오는 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const INSERT_CONTACT_FAILED: &str = "연락처 저장 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const UPDATE_CONTACT_FAILED: &str = "연락처 수정 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const PIN_CONTACT_FAILED: &str = "내 사람 고정 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const DELETE_CONTACT_FAILED: &str = "연락처 삭제 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const FETCH_CALENDAR_FAILED: &str = "캘린더 데이터를 불러오는 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const FETCH_PLAN_FAILED: &str = "약속을 불러오는 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const INSERT_PLAN_FAILED: &str = "약속 추가 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const UPDATE_PLAN_FAILED: &str = "약속 수정 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const MOVE_PLAN_FAILED: &str = "약속 업데이트 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const DELETE_PLAN_FAILED: &str = "약속 삭제 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const SIGN_OUT_FAILED: &str = "로그아웃 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const CHANGE_PASSWORD_FAILED: &str = "비밀번호 재설정 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const RESET_EMAIL_FAILED: &str =
    "비밀번호 재설정 이메일 전송 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const PLACE_SEARCH_FAILED: &str = "장소 검색 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const OAUTH_FAILED: &str = "소셜 로그인 중 문제가 발생했습니다. 다시 시도해주세요.";
pub const HOLIDAYS_FAILED: &str = "공휴일 정보를 불러오는 중 문제가 발생했습니다.";
pub const RECOVERY_LINK_INVALID: &str = "유효하지 않거나 만료된 링크입니다.";

// Success notices
pub const PLAN_ADDED: &str = "약속이 추가되었습니다.";
pub const PLAN_UPDATED: &str = "약속이 수정되었습니다.";
pub const PLAN_DELETED: &str = "성공적으로 삭제되었습니다.";
pub const CONTACT_DELETED: &str = "연락처가 삭제되었습니다.";

/// Builds the welcome notice shown once per sign-in
pub fn welcome(nickname: &str) -> String {
    format!("{}님, 환영합니다!", nickname)
}

/// Builds the notice shown after a contact is added
pub fn contact_added(name: &str) -> String {
    format!("{} 연락처가 성공적으로 추가되었습니다.", name)
}

/// Builds the notice shown after a contact is edited
pub fn contact_updated(name: &str) -> String {
    format!("{} 연락처가 성공적으로 수정되었습니다.", name)
}
