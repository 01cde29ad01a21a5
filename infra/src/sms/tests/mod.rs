mod sender_tests;
