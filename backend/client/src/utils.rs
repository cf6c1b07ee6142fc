use records::Certificate;
use reqwest::Url;

/// Public verification page for a certificate: `<origin>/certificate/<id>`.
///
/// This is the text the admin page encodes into its QR code.
pub fn verification_link(origin: &str, certificate_no: &str) -> Option<Url> {
    let mut url = Url::parse(origin).ok()?;

    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["certificate", certificate_no]);

    Some(url)
}

pub fn describe(certificate: &Certificate) -> String {
    format!(
        "Certificate No: {}\nStudent Name:   {}\nFather Name:    {}\nDuration:       {}\nCompleted On:   {}\nStatus:         {}",
        certificate.certificate_no,
        certificate.student_name,
        certificate.father_name,
        certificate.duration,
        certificate.display_date(),
        certificate.status,
    )
}

pub fn summary_line(certificate: &Certificate) -> String {
    format!(
        "{:<14} {:<24} {:<24} {}",
        certificate.certificate_no,
        certificate.student_name,
        certificate.father_name,
        certificate.status
    )
}
