use assert_matches::assert_matches;

use lms_server::CoreError;
use lms_server::model::{EnrollmentStatus, ProgramType};

mod support;
use support::{
    TestApp, answers, draft, free_draft, module_with, question, quiz_item, video_item,
    video_module,
};

#[test]
fn two_videos_reach_fifty_then_hundred_with_certificate() {
    let app = TestApp::new();
    let program = app.published_video_program(&["videos/a.mp4", "videos/b.mp4"]);
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let halfway = app
        .tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect("first video");
    assert_eq!(halfway.completion_percentage, 50);
    assert_eq!(halfway.status, EnrollmentStatus::Active);
    assert!(!halfway.certificate_issued);
    assert!(app.certificates_for(&student).is_empty());

    let done = app
        .tracker()
        .complete_video(&student, &program.id, "videos/b.mp4")
        .expect("second video");
    assert_eq!(done.completion_percentage, 100);
    assert_eq!(done.status, EnrollmentStatus::Completed);
    assert!(done.certificate_issued);

    let certificates = app.certificates_for(&student);
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].program_id, program.id);
    assert!(certificates[0].certificate_id.starts_with("CERT-"));
    assert!(certificates[0].artifact_url.ends_with(".pdf"));
}

#[test]
fn complete_video_is_idempotent() {
    let app = TestApp::new();
    let program = app.published_video_program(&["videos/a.mp4", "videos/b.mp4"]);
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let first = app
        .tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect("first call");
    let second = app
        .tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect("repeat call");

    assert_eq!(first.completion_percentage, second.completion_percentage);
    assert_eq!(second.progress.completed_videos.len(), 1);
}

#[test]
fn failing_quiz_records_attempt_without_advancing() {
    let app = TestApp::new();
    // 13 of 20 points = 65%, below the 70% bar.
    let quiz = app.add_quiz("q-1", 70, vec![question("a", 13), question("b", 7)]);
    let program = app
        .lifecycle()
        .create(free_draft(
            "Mixed",
            vec![module_with(
                "Module 1",
                vec![
                    video_item("Lesson", "videos/a.mp4"),
                    quiz_item("Checkpoint", "q-1"),
                ],
            )],
        ))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let result = app
        .tracker()
        .submit_quiz(&student, &program.id, &quiz.id, &answers(&[(0, "a")]))
        .expect("submit");

    assert_eq!(result.score, 65);
    assert!(!result.passed);
    assert_eq!(result.enrollment.completion_percentage, 0);
    assert_eq!(result.enrollment.progress.quiz_attempts.len(), 1);
    assert!(!result.enrollment.progress.quiz_attempts[0].passed);
}

#[test]
fn passing_the_same_quiz_twice_counts_once() {
    let app = TestApp::new();
    let quiz = app.add_quiz("q-1", 70, vec![question("a", 1)]);
    let program = app
        .lifecycle()
        .create(free_draft(
            "Mixed",
            vec![module_with(
                "Module 1",
                vec![
                    video_item("Lesson", "videos/a.mp4"),
                    quiz_item("Checkpoint", "q-1"),
                ],
            )],
        ))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let perfect = answers(&[(0, "a")]);
    app.tracker()
        .submit_quiz(&student, &program.id, &quiz.id, &perfect)
        .expect("first pass");
    let second = app
        .tracker()
        .submit_quiz(&student, &program.id, &quiz.id, &perfect)
        .expect("second pass");

    // History keeps both attempts; completion counts the quiz once.
    assert_eq!(second.enrollment.progress.quiz_attempts.len(), 2);
    assert_eq!(second.enrollment.completion_percentage, 50);
}

#[test]
fn quiz_only_program_totals_correctly() {
    let app = TestApp::new();
    let first = app.add_quiz("q-1", 70, vec![question("a", 1)]);
    let second = app.add_quiz("q-2", 70, vec![question("b", 1)]);
    let program = app
        .lifecycle()
        .create(free_draft(
            "Assessments",
            vec![module_with(
                "Module 1",
                vec![quiz_item("First", "q-1"), quiz_item("Second", "q-2")],
            )],
        ))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let halfway = app
        .tracker()
        .submit_quiz(&student, &program.id, &first.id, &answers(&[(0, "a")]))
        .expect("first quiz");
    assert_eq!(halfway.enrollment.completion_percentage, 50);

    let done = app
        .tracker()
        .submit_quiz(&student, &program.id, &second.id, &answers(&[(0, "b")]))
        .expect("second quiz");
    assert_eq!(done.enrollment.completion_percentage, 100);
    assert_eq!(done.enrollment.status, EnrollmentStatus::Completed);
    assert!(done.enrollment.certificate_issued);
    assert_eq!(app.certificates_for(&student).len(), 1);
}

#[test]
fn empty_program_never_divides_by_zero() {
    let app = TestApp::new();
    let quiz = app.add_quiz("q-1", 70, vec![question("a", 1)]);
    let program = app
        .lifecycle()
        .create(free_draft("Hollow", vec![]))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    // The quiz exists but is not part of the program's content, so the
    // total stays zero and so does the percentage.
    let result = app
        .tracker()
        .submit_quiz(&student, &program.id, &quiz.id, &answers(&[(0, "a")]))
        .expect("submit");
    assert_eq!(result.enrollment.completion_percentage, 0);
    assert_eq!(result.enrollment.status, EnrollmentStatus::Active);
    assert!(!result.enrollment.certificate_issued);
}

#[test]
fn unknown_video_reference_is_rejected() {
    let app = TestApp::new();
    let program = app.published_video_program(&["videos/a.mp4"]);
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let err = app
        .tracker()
        .complete_video(&student, &program.id, "videos/rogue.mp4")
        .expect_err("not part of the program");
    assert_matches!(err, CoreError::NotFound { .. });

    let enrollment = app.find_enrollment(&student, &program.id);
    assert!(enrollment.progress.completed_videos.is_empty());
}

#[test]
fn completion_without_enrollment_is_not_found() {
    let app = TestApp::new();
    let program = app.published_video_program(&["videos/a.mp4"]);
    let student = app.student("s-1", "Asha Rao");

    let err = app
        .tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect_err("no enrollment");
    assert_matches!(err, CoreError::NotFound { .. });
}

#[test]
fn retrying_the_completing_call_issues_one_certificate() {
    let app = TestApp::new();
    let program = app.published_video_program(&["videos/a.mp4"]);
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    app.tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect("complete");
    let retried = app
        .tracker()
        .complete_video(&student, &program.id, "videos/a.mp4")
        .expect("retry");

    assert_eq!(retried.completion_percentage, 100);
    assert!(retried.certificate_issued);
    assert_eq!(app.certificates_for(&student).len(), 1);
}

#[test]
fn internship_enrollment_for_paid_program_totals_over_modules() {
    let app = TestApp::new();
    // Internships may still carry optional content; when they do, the
    // same recomputation applies.
    let program = app
        .lifecycle()
        .create(draft(
            "Internship",
            ProgramType::Internship,
            1500,
            vec![video_module("Orientation", "videos/orientation.mp4")],
        ))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enrollment_service()
        .enroll_paid(&student, &program.id)
        .expect("paid enrollment");

    let done = app
        .tracker()
        .complete_video(&student, &program.id, "videos/orientation.mp4")
        .expect("complete");
    assert_eq!(done.completion_percentage, 100);
}

#[test]
fn concurrent_completions_do_not_lose_updates() {
    let app = TestApp::new();
    let videos: Vec<String> = (0..8).map(|i| format!("videos/{i}.mp4")).collect();
    let refs: Vec<&str> = videos.iter().map(String::as_str).collect();
    let program = app.published_video_program(&refs);
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    std::thread::scope(|scope| {
        for video in &videos {
            let app = &app;
            let student = &student;
            let program_id = &program.id;
            scope.spawn(move || {
                app.tracker()
                    .complete_video(student, program_id, video)
                    .expect("complete");
            });
        }
    });

    let enrollment = app.find_enrollment(&student, &program.id);
    assert_eq!(enrollment.completion_percentage, 100);
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    assert!(enrollment.certificate_issued);
    assert_eq!(app.certificates_for(&student).len(), 1);
}

#[test]
fn score_meeting_the_bar_exactly_passes() {
    let app = TestApp::new();
    let quiz = app.add_quiz("q-1", 50, vec![question("a", 1), question("b", 1)]);
    let program = app
        .lifecycle()
        .create(free_draft(
            "Mixed",
            vec![module_with(
                "Module 1",
                vec![
                    video_item("Lesson", "videos/a.mp4"),
                    quiz_item("Checkpoint", "q-1"),
                ],
            )],
        ))
        .expect("create");
    let student = app.student("s-1", "Asha Rao");
    app.enroll(&student, &program.id);

    let result = app
        .tracker()
        .submit_quiz(&student, &program.id, &quiz.id, &answers(&[(0, "a")]))
        .expect("submit");
    assert_eq!(result.score, 50);
    assert!(result.passed);
}
