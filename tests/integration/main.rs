mod support;

mod directory_view_test;
